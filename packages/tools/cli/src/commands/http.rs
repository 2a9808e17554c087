use anyhow::Context as _;
use reqwest::Client;
use serde::{de::DeserializeOwned, Serialize};

use cardauth_core::wire::ErrorBody;

pub fn client() -> Client {
    Client::new()
}

/// JSON 요청을 보내고 응답 본문을 파싱
///
/// 실패 응답은 `{code}` 본문이 있으면 그 코드를 에러 메시지에 담습니다.
pub async fn post_json<B: Serialize, T: DeserializeOwned>(
    client: &Client,
    url: &str,
    body: &B,
) -> anyhow::Result<T> {
    let resp = client
        .post(url)
        .json(body)
        .send()
        .await
        .context("request failed")?;

    let status = resp.status();
    if !status.is_success() {
        let text = resp.text().await.unwrap_or_default();
        return Err(match serde_json::from_str::<ErrorBody>(&text) {
            Ok(error) => anyhow::anyhow!("request failed ({}): error code {}", status, error.code),
            Err(_) => anyhow::anyhow!("request failed ({})", status),
        });
    }

    resp.json::<T>().await.context("invalid json response")
}

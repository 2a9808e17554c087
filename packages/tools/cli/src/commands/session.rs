//! 세션 명령어
//!
//! `login`은 핸드셰이크 전체를 수행합니다.
//! 1. 챌린지 요청
//! 2. 카드 개인키로 복호화
//! 3. 서버 공개키로 다시 암호화해 제출 → Access Code
//! 4. Access Code를 토큰으로 교환

use anyhow::Context as _;

use cardauth_core::credential::ResourceOwner;
use cardauth_core::crypto::{CryptoCapability, DalekCrypto};
use cardauth_core::wire::{
    AccessTokenRequest, AcknowledgeRequest, Challenge, CodeGrant, HandshakeRequest,
    RefreshRequest, TokenGrant, VerifyRequest, GRANT_ACCESS_CODE, GRANT_REFRESH_TOKEN,
};

use super::http::{client, post_json};
use super::keys::{load_private_key, load_public_key};
use crate::config::CliConfig;

pub struct LoginArgs<'a> {
    pub server_url: &'a str,
    pub card_id: &'a str,
    pub card_key: &'a str,
    pub server_key: &'a str,
    pub scope: Option<&'a str>,
}

pub async fn login(config: &mut CliConfig, args: LoginArgs<'_>) -> anyhow::Result<()> {
    let crypto = DalekCrypto::new();
    let card_key = load_private_key(&crypto, args.card_key)?;
    let server_key = load_public_key(&crypto, args.server_key)?;
    let client = client();

    let challenge: Challenge = post_json(
        &client,
        &format!("{}/authorization-grant/actions/get-challenge-message", args.server_url),
        &HandshakeRequest {
            resource_owner_id: args.card_id.to_string(),
            scope: args.scope.map(str::to_string),
        },
    )
    .await
    .context("handshake failed")?;

    let plain = crypto
        .decrypt(&challenge.encrypted_message, &card_key)
        .context("cannot decrypt challenge; is this the card's private key?")?;
    let answer = crypto.encrypt(&plain, &server_key)?;

    let grant: CodeGrant = post_json(
        &client,
        &format!(
            "{}/authorization-grant/{}/actions/acknowledge",
            args.server_url, challenge.authorization_grant_id
        ),
        &AcknowledgeRequest {
            encrypted_message: answer,
        },
    )
    .await
    .context("acknowledge failed")?;

    let tokens: TokenGrant = post_json(
        &client,
        &format!("{}/authorization/actions/obtain-access-token", args.server_url),
        &AccessTokenRequest {
            grant_type: GRANT_ACCESS_CODE.to_string(),
            code: grant.code,
        },
    )
    .await
    .context("token exchange failed")?;

    config.server_url = Some(args.server_url.to_string());
    config.card_id = Some(args.card_id.to_string());
    config.access_token = Some(tokens.access_token);
    config.refresh_token = tokens.refresh_token;
    config.save()?;

    println!("Logged in as {} (expires in {}s)", args.card_id, tokens.expires_in);
    Ok(())
}

pub async fn refresh(config: &mut CliConfig, server_url: &str) -> anyhow::Result<()> {
    let tokens: TokenGrant = post_json(
        &client(),
        &format!("{server_url}/authorization/actions/refresh-access-token"),
        &RefreshRequest {
            grant_type: GRANT_REFRESH_TOKEN.to_string(),
            refresh_token: config.refresh_token()?,
        },
    )
    .await
    .context("refresh failed")?;

    config.access_token = Some(tokens.access_token);
    config.save()?;

    println!("Access token refreshed (expires in {}s)", tokens.expires_in);
    Ok(())
}

pub async fn verify(
    config: &CliConfig,
    server_url: &str,
    token: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let access_token = match token {
        Some(token) => token,
        None => config.access_token()?,
    };

    let owner: ResourceOwner = post_json(
        &client(),
        &format!("{server_url}/authorization/actions/verify"),
        &VerifyRequest { access_token },
    )
    .await
    .context("verify failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&owner)?);
    } else {
        println!("Resource owner: {}", owner.id);
        println!("Scope:          {}", owner.scope);
    }
    Ok(())
}

pub fn logout(config: &mut CliConfig) -> anyhow::Result<()> {
    if config.access_token.is_none() && config.refresh_token.is_none() {
        println!("Not logged in");
        return Ok(());
    }
    config.clear_session();
    config.save()?;
    println!("Logged out");
    Ok(())
}

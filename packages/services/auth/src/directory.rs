//! 원격 카드 디렉터리 클라이언트
//!
//! `GET {base}/card/{id}` 응답:
//!
//! ```json
//! {"id": "<card id>", "public_key": "<base64>", "signatures": {"<signer id>": "<base64>"}}
//! ```
//!
//! 권한자가 설정되어 있으면 `card_id || public_key` 바이트에 대한 권한자 서명이
//! 있어야 합니다.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;

use cardauth_core::crypto::{CryptoCapability, PublicKey};
use cardauth_core::directory::{CardDirectory, DirectoryError};

/// 카드 ID 길이 (hex)
const CARD_ID_LEN: usize = 64;

/// 디렉터리 응답
#[derive(Debug, Deserialize)]
struct CardRecord {
    id: String,
    public_key: String,
    #[serde(default)]
    signatures: HashMap<String, String>,
}

/// 카드 서명 권한자
#[derive(Debug, Clone)]
pub struct Authority {
    pub card_id: String,
    pub public_key: PublicKey,
}

pub struct HttpCardDirectory {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
    crypto: Arc<dyn CryptoCapability>,
    authority: Option<Authority>,
}

impl HttpCardDirectory {
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        crypto: Arc<dyn CryptoCapability>,
        authority: Option<Authority>,
    ) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            token,
            crypto,
            authority,
        }
    }

    fn validate_card_id(card_id: &str) -> Result<(), DirectoryError> {
        if card_id.len() == CARD_ID_LEN && card_id.chars().all(|c| c.is_ascii_hexdigit()) {
            Ok(())
        } else {
            Err(DirectoryError::InvalidCardId)
        }
    }

    async fn fetch(&self, card_id: &str) -> Result<CardRecord, DirectoryError> {
        let url = format!("{}/card/{}", self.base_url, card_id);
        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Err(DirectoryError::NotFound),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(DirectoryError::Unauthorized)
            }
            status if !status.is_success() => {
                return Err(DirectoryError::Transport(format!(
                    "directory responded with {status}"
                )))
            }
            _ => {}
        }

        response
            .json::<CardRecord>()
            .await
            .map_err(|e| DirectoryError::Transport(format!("invalid card record: {e}")))
    }

    fn verify_record(
        &self,
        card_id: &str,
        record: &CardRecord,
    ) -> Result<PublicKey, DirectoryError> {
        if !record.id.eq_ignore_ascii_case(card_id) {
            return Err(DirectoryError::InvalidSignatureChain(
                "card id mismatch".to_string(),
            ));
        }

        let key_bytes = general_purpose::STANDARD
            .decode(record.public_key.trim())
            .map_err(|_| {
                DirectoryError::InvalidSignatureChain("malformed public key".to_string())
            })?;
        let key = self
            .crypto
            .import_public_key(&key_bytes)
            .map_err(|e| DirectoryError::InvalidSignatureChain(e.to_string()))?;

        let Some(authority) = &self.authority else {
            return Ok(key);
        };

        let signature = record
            .signatures
            .get(&authority.card_id)
            .ok_or_else(|| {
                DirectoryError::InvalidSignatureChain("missing authority signature".to_string())
            })?;
        let signature = general_purpose::STANDARD
            .decode(signature.trim())
            .map_err(|_| {
                DirectoryError::InvalidSignatureChain("malformed authority signature".to_string())
            })?;

        let mut signed = card_id.as_bytes().to_vec();
        signed.extend_from_slice(&key_bytes);

        match self.crypto.verify(&signed, &signature, &authority.public_key) {
            Ok(true) => Ok(key),
            _ => Err(DirectoryError::InvalidSignatureChain(
                "authority signature mismatch".to_string(),
            )),
        }
    }
}

#[async_trait]
impl CardDirectory for HttpCardDirectory {
    async fn resolve(&self, card_id: &str) -> Result<PublicKey, DirectoryError> {
        Self::validate_card_id(card_id)?;
        let record = self.fetch(card_id).await?;
        self.verify_record(card_id, &record)
    }
}

//! 토큰 발급 및 검증
//!
//! 서명 키는 시작 시 한 번 로드되어 이후 읽기 전용으로 공유됩니다.

use std::sync::Arc;

use base64::{engine::general_purpose, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::claims::AccessTokenClaims;
use crate::credential::ResourceOwner;
use crate::crypto::{CryptoCapability, CryptoError, PrivateKey, PublicKey};

const TOKEN_TYPE: &str = "JWT";

/// 토큰 에러
///
/// 파싱 실패는 원인과 무관하게 [`TokenError::Invalid`] 하나로 보고합니다.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("invalid token")]
    Invalid,

    #[error("token signing failed: {0}")]
    Signing(#[source] CryptoError),

    #[error("token encoding failed: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// 토큰 헤더
#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    typ: String,
}

/// 발급된 토큰
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl IssuedToken {
    pub fn expires_in(&self) -> i64 {
        (self.expires_at - self.issued_at).num_seconds()
    }
}

/// Bearer 토큰 코덱
pub struct TokenCodec {
    crypto: Arc<dyn CryptoCapability>,
    signing_key: PrivateKey,
    verifying_key: PublicKey,
}

impl TokenCodec {
    /// 새 코덱 생성 (검증 키는 서명 키에서 추출)
    pub fn new(
        crypto: Arc<dyn CryptoCapability>,
        signing_key: PrivateKey,
    ) -> Result<Self, CryptoError> {
        let verifying_key = crypto.extract_public_key(&signing_key)?;
        Ok(Self {
            crypto,
            signing_key,
            verifying_key,
        })
    }

    /// 이 코덱이 발급하는 유일한 알고리즘 식별자
    pub fn algorithm(&self) -> &'static str {
        self.crypto.algorithm()
    }

    /// 토큰 발급
    pub fn make(
        &self,
        owner: &ResourceOwner,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let claims = AccessTokenClaims::new(owner, now);
        let header = Header {
            alg: self.algorithm().to_string(),
            typ: TOKEN_TYPE.to_string(),
        };

        let header = general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(&header)?);
        let payload = general_purpose::URL_SAFE_NO_PAD.encode(serde_json::to_vec(&claims)?);
        let signing_input = format!("{header}.{payload}");

        let signature = self
            .crypto
            .sign(signing_input.as_bytes(), &self.signing_key)
            .map_err(TokenError::Signing)?;

        Ok(IssuedToken {
            token: format!(
                "{signing_input}.{}",
                general_purpose::URL_SAFE_NO_PAD.encode(signature)
            ),
            issued_at: claims.iat,
            expires_at: claims.exp,
        })
    }

    /// 토큰 검증 및 Claims 추출
    ///
    /// 만료는 확인하지 않습니다. 호출자가 `claims.is_expired_at(now)`로 판단합니다.
    pub fn parse(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, payload, signature] = segments.as_slice() else {
            return Err(TokenError::Invalid);
        };

        let header_bytes = decode_segment(header)?;
        let parsed: Header =
            serde_json::from_slice(&header_bytes).map_err(|_| TokenError::Invalid)?;
        if parsed.alg != self.algorithm() {
            return Err(TokenError::Invalid);
        }

        let signature = decode_segment(signature)?;
        let signing_input = format!("{header}.{payload}");
        let valid = self
            .crypto
            .verify(signing_input.as_bytes(), &signature, &self.verifying_key)
            .map_err(|_| TokenError::Invalid)?;
        if !valid {
            return Err(TokenError::Invalid);
        }

        let payload = decode_segment(payload)?;
        serde_json::from_slice(&payload).map_err(|_| TokenError::Invalid)
    }
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    general_purpose::URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| TokenError::Invalid)
}

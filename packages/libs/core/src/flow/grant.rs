//! 챌린지-응답 핸드셰이크
//!
//! 1. Handshake: 디렉터리에서 카드 공개키를 찾고, 랜덤 챌린지를 그 키로 암호화해 전달
//! 2. Acknowledge: 클라이언트가 챌린지를 복호화한 뒤 서버 공개키로 다시 암호화해 제출.
//!    서버가 복호화한 값이 저장된 챌린지와 같으면 Access Code 발급
//!
//! 챌린지 평문은 전송 구간에 나타나지 않습니다.

use std::sync::Arc;

use subtle::ConstantTimeEq;

use crate::clock::Clock;
use crate::credential::{Expiring, ResourceOwner};
use crate::crypto::{CryptoCapability, PrivateKey};
use crate::directory::{CardDirectory, DirectoryError};
use crate::store::Credentials;
use crate::wire::{Challenge, CodeGrant};
use crate::{Error, Result};

#[derive(Clone)]
pub struct GrantFlow {
    directory: Arc<dyn CardDirectory>,
    credentials: Credentials,
    crypto: Arc<dyn CryptoCapability>,
    server_key: PrivateKey,
    clock: Arc<dyn Clock>,
}

impl GrantFlow {
    pub fn new(
        directory: Arc<dyn CardDirectory>,
        credentials: Credentials,
        crypto: Arc<dyn CryptoCapability>,
        server_key: PrivateKey,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            credentials,
            crypto,
            server_key,
            clock,
        }
    }

    /// 챌린지 발급
    pub async fn handshake(&self, owner: &ResourceOwner) -> Result<Challenge> {
        if owner.id.is_empty() {
            return Err(Error::invalid_request("resource_owner_id is required"));
        }
        let now = self.clock.now();

        let card_key = self
            .directory
            .resolve(&owner.id)
            .await
            .map_err(|e| match e {
                DirectoryError::NotFound => Error::CardNotFound,
                DirectoryError::Unauthorized => Error::CardProtected,
                DirectoryError::InvalidCardId | DirectoryError::InvalidSignatureChain(_) => {
                    Error::CardInvalid
                }
                DirectoryError::Transport(_) => {
                    Error::internal("GetChallengeMessage[resolve card]", e)
                }
            })?;

        let attempt = self
            .credentials
            .issue_attempt(owner, now)
            .await
            .map_err(|e| Error::internal("GetChallengeMessage[issue attempt]", e))?;

        let encrypted_message = self
            .crypto
            .encrypt(&attempt.challenge, &card_key)
            .map_err(|e| Error::internal("GetChallengeMessage[encrypt challenge]", e))?;

        tracing::debug!(owner = %owner.id, attempt = %attempt.id, "challenge issued");

        Ok(Challenge {
            authorization_grant_id: attempt.id,
            encrypted_message,
        })
    }

    /// 챌린지 응답 확인 후 Access Code 발급
    ///
    /// 응답이 틀리면 Attempt를 소비하지 않으므로 만료 전까지 재시도할 수 있습니다.
    pub async fn acknowledge(
        &self,
        attempt_id: &str,
        encrypted_message: &[u8],
    ) -> Result<CodeGrant> {
        let now = self.clock.now();
        let store = self.credentials.store();

        let attempt = store
            .find_attempt(attempt_id)
            .await
            .map_err(|e| Error::internal("Acknowledge[find attempt]", e))?
            .filter(|attempt| !attempt.is_expired_at(now))
            .ok_or(Error::AttemptNotFound)?;

        let response = self
            .crypto
            .decrypt(encrypted_message, &self.server_key)
            .map_err(|_| Error::EncryptedMessageValidationFailed)?;
        if !bool::from(response.as_slice().ct_eq(&attempt.challenge)) {
            return Err(Error::EncryptedMessageValidationFailed);
        }

        // 동시에 맞는 응답이 여러 개 와도 take에 성공한 하나만 코드를 받음
        let attempt = store
            .take_attempt(attempt_id)
            .await
            .map_err(|e| Error::internal("Acknowledge[take attempt]", e))?
            .ok_or(Error::AttemptNotFound)?;

        let code = self
            .credentials
            .issue_code(&attempt.owner(), now)
            .await
            .map_err(|e| Error::internal("Acknowledge[issue code]", e))?;

        tracing::debug!(owner = %attempt.owner_id, "access code issued");

        Ok(CodeGrant { code: code.code })
    }
}

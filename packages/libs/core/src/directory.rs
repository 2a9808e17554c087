//! 카드 디렉터리 capability
//!
//! 외부 디렉터리 서비스가 카드 ID를 공개키로 해석합니다. 신뢰 체인 검증은
//! 디렉터리 구현의 책임이며, 코어는 결과 분류만 봅니다.

use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use thiserror::Error;

use crate::crypto::{CryptoCapability, PublicKey};

/// 디렉터리 조회 실패 분류
#[derive(Debug, Clone, Error)]
pub enum DirectoryError {
    #[error("card not found")]
    NotFound,

    #[error("card access denied")]
    Unauthorized,

    #[error("invalid card id")]
    InvalidCardId,

    #[error("card signature chain verification failed: {0}")]
    InvalidSignatureChain(String),

    #[error("directory transport error: {0}")]
    Transport(String),
}

/// 카드 디렉터리
#[async_trait]
pub trait CardDirectory: Send + Sync {
    async fn resolve(&self, card_id: &str) -> Result<PublicKey, DirectoryError>;
}

/// 고정 카드 목록 디렉터리 (로컬 개발/테스트용)
#[derive(Debug, Default)]
pub struct StaticCardDirectory {
    cards: RwLock<HashMap<String, PublicKey>>,
}

impl StaticCardDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// 카드 등록
    pub fn insert(&self, card_id: impl Into<String>, key: PublicKey) {
        let mut cards = self.cards.write().unwrap_or_else(|e| e.into_inner());
        cards.insert(card_id.into(), key);
    }

    /// `{"<card id>": "<base64 public key>"}` 형식 JSON에서 로드
    pub fn from_json(json: &str, crypto: &dyn CryptoCapability) -> Result<Self, DirectoryError> {
        let raw: HashMap<String, String> = serde_json::from_str(json)
            .map_err(|e| DirectoryError::Transport(format!("invalid directory file: {e}")))?;

        let directory = Self::new();
        for (card_id, encoded) in raw {
            let bytes = general_purpose::STANDARD
                .decode(encoded.trim())
                .or_else(|_| general_purpose::URL_SAFE_NO_PAD.decode(encoded.trim()))
                .map_err(|e| {
                    DirectoryError::Transport(format!("card {card_id}: invalid base64: {e}"))
                })?;
            let key = crypto
                .import_public_key(&bytes)
                .map_err(|e| DirectoryError::Transport(format!("card {card_id}: {e}")))?;
            directory.insert(card_id, key);
        }
        Ok(directory)
    }

    /// JSON 파일에서 로드
    pub fn from_file(path: &Path, crypto: &dyn CryptoCapability) -> Result<Self, DirectoryError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            DirectoryError::Transport(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_json(&content, crypto)
    }

    pub fn len(&self) -> usize {
        self.cards.read().map(|cards| cards.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CardDirectory for StaticCardDirectory {
    async fn resolve(&self, card_id: &str) -> Result<PublicKey, DirectoryError> {
        if card_id.is_empty() {
            return Err(DirectoryError::InvalidCardId);
        }
        let cards = self
            .cards
            .read()
            .map_err(|_| DirectoryError::Transport("directory lock poisoned".to_string()))?;
        cards.get(card_id).cloned().ok_or(DirectoryError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::DalekCrypto;

    #[tokio::test]
    async fn test_static_directory_resolve() {
        let crypto = DalekCrypto::new();
        let key = crypto
            .extract_public_key(&crypto.generate_private_key().unwrap())
            .unwrap();

        let directory = StaticCardDirectory::new();
        directory.insert("alice-card", key.clone());

        assert_eq!(directory.resolve("alice-card").await.unwrap(), key);
        assert!(matches!(
            directory.resolve("bob-card").await,
            Err(DirectoryError::NotFound)
        ));
        assert!(matches!(
            directory.resolve("").await,
            Err(DirectoryError::InvalidCardId)
        ));
    }

    #[test]
    fn test_static_directory_from_json() {
        let crypto = DalekCrypto::new();
        let key = crypto
            .extract_public_key(&crypto.generate_private_key().unwrap())
            .unwrap();
        let json = serde_json::json!({
            "alice-card": general_purpose::STANDARD.encode(crypto.export_public_key(&key)),
        })
        .to_string();

        let directory = StaticCardDirectory::from_json(&json, &crypto).unwrap();
        assert_eq!(directory.len(), 1);

        let bad = r#"{"alice-card": "not base64!"}"#;
        assert!(StaticCardDirectory::from_json(bad, &crypto).is_err());
    }

    #[test]
    fn test_static_directory_from_file() {
        let crypto = DalekCrypto::new();
        let key = crypto
            .extract_public_key(&crypto.generate_private_key().unwrap())
            .unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cards.json");
        let json = serde_json::json!({
            "alice-card": general_purpose::URL_SAFE_NO_PAD.encode(crypto.export_public_key(&key)),
        });
        std::fs::write(&path, json.to_string()).unwrap();

        let directory = StaticCardDirectory::from_file(&path, &crypto).unwrap();
        assert!(!directory.is_empty());
    }
}

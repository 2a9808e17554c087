//! 서명/암호화 capability
//!
//! 코어는 특정 암호 라이브러리 타입에 의존하지 않고 [`CryptoCapability`]만 사용합니다.
//! 키는 공개키/개인키를 별도 타입으로 구분하며, 내용은 해당 capability가
//! import 시 검증한 바이트입니다.

mod dalek;
mod material;

use std::fmt;

use thiserror::Error;
use zeroize::Zeroizing;

pub use dalek::DalekCrypto;
pub use material::parse_key_material;

/// 암호 연산 에러
#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("encryption failed")]
    Encryption,

    #[error("decryption failed")]
    Decryption,
}

pub type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// 공개키 (capability가 검증한 export 형식 바이트)
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PublicKey(Vec<u8>);

impl PublicKey {
    pub(crate) fn from_validated(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(&self.0))
    }
}

/// 개인키 (drop 시 zeroize)
#[derive(Clone)]
pub struct PrivateKey(Zeroizing<Vec<u8>>);

impl PrivateKey {
    pub(crate) fn from_validated(bytes: Vec<u8>) -> Self {
        Self(Zeroizing::new(bytes))
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PrivateKey(..)")
    }
}

/// 서명/암호화 capability
pub trait CryptoCapability: Send + Sync {
    /// Bearer 토큰 헤더에 들어갈 알고리즘 식별자
    fn algorithm(&self) -> &'static str;

    fn generate_private_key(&self) -> CryptoResult<PrivateKey>;

    fn import_private_key(&self, data: &[u8]) -> CryptoResult<PrivateKey>;

    fn import_public_key(&self, data: &[u8]) -> CryptoResult<PublicKey>;

    fn export_private_key(&self, key: &PrivateKey) -> Zeroizing<Vec<u8>>;

    fn export_public_key(&self, key: &PublicKey) -> Vec<u8>;

    fn extract_public_key(&self, key: &PrivateKey) -> CryptoResult<PublicKey>;

    fn sign(&self, data: &[u8], key: &PrivateKey) -> CryptoResult<Vec<u8>>;

    /// 서명이 맞으면 `Ok(true)`, 형식은 맞지만 서명이 틀리면 `Ok(false)`
    fn verify(&self, data: &[u8], signature: &[u8], key: &PublicKey) -> CryptoResult<bool>;

    fn encrypt(&self, data: &[u8], recipient: &PublicKey) -> CryptoResult<Vec<u8>>;

    fn decrypt(&self, data: &[u8], key: &PrivateKey) -> CryptoResult<Vec<u8>>;

    /// 공개키 지문 (hex)
    fn fingerprint(&self, key: &PublicKey) -> String;
}

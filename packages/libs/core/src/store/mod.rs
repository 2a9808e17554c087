//! 자격증명 저장소 계약
//!
//! 저장 엔진 자체는 외부에 있고, 여기서는 엔진이 지켜야 할 연산만 정의합니다.
//!
//! # 원자성
//!
//! 1회용 자격증명(Attempt, AccessCode)의 소비는 반드시 저장소의 단일 원자 연산
//! (조건부 update 또는 delete-and-return)이어야 합니다. 같은 ID에 대해 N개의 동시
//! 호출이 있으면 정확히 하나만 성공을 관측합니다. 애플리케이션은 read-then-write로
//! 소비를 구현하지 않습니다.

mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::credential::{AccessCode, Attempt, CredentialPolicy, RefreshToken, ResourceOwner};

pub use memory::MemoryCredentialStore;

/// 저장소 에러
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error("duplicate credential identifier")]
    Duplicate,

    #[error("corrupt credential record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// 1회용 자격증명 redeem 결과
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Redemption<T> {
    /// 이번 호출이 소비에 성공함 (만료 여부는 호출자가 판단)
    Redeemed(T),

    /// 존재하지만 이미 소비됨
    AlreadyUsed,

    /// 존재하지 않음
    NotFound,
}

/// 자격증명 저장소
#[async_trait]
pub trait CredentialStore: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Attempt
    // ─────────────────────────────────────────────────────────────────────────
    async fn insert_attempt(&self, attempt: &Attempt) -> StoreResult<()>;

    /// 소비하지 않는 조회
    async fn find_attempt(&self, id: &str) -> StoreResult<Option<Attempt>>;

    /// 원자적 삭제 후 반환. 동시에 호출되면 하나만 `Some`을 받습니다.
    async fn take_attempt(&self, id: &str) -> StoreResult<Option<Attempt>>;

    // ─────────────────────────────────────────────────────────────────────────
    // AccessCode
    // ─────────────────────────────────────────────────────────────────────────
    async fn insert_code(&self, code: &AccessCode) -> StoreResult<()>;

    /// 원자적 unused → used 전환
    async fn redeem_code(&self, code: &str) -> StoreResult<Redemption<AccessCode>>;

    // ─────────────────────────────────────────────────────────────────────────
    // RefreshToken
    // ─────────────────────────────────────────────────────────────────────────
    async fn insert_refresh_token(&self, token: &RefreshToken) -> StoreResult<()>;

    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>>;
}

/// 발급 정책 + 저장소
///
/// `issue_*`는 랜덤 식별자를 만들고 `now + ttl`로 만료를 정한 뒤 저장하고
/// 전체 자격증명을 돌려줍니다.
#[derive(Clone)]
pub struct Credentials {
    store: Arc<dyn CredentialStore>,
    policy: CredentialPolicy,
}

impl Credentials {
    pub fn new(store: Arc<dyn CredentialStore>, policy: CredentialPolicy) -> Self {
        Self { store, policy }
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub async fn issue_attempt(
        &self,
        owner: &ResourceOwner,
        now: DateTime<Utc>,
    ) -> StoreResult<Attempt> {
        let attempt = self.policy.new_attempt(owner, now);
        self.store.insert_attempt(&attempt).await?;
        Ok(attempt)
    }

    pub async fn issue_code(
        &self,
        owner: &ResourceOwner,
        now: DateTime<Utc>,
    ) -> StoreResult<AccessCode> {
        let code = self.policy.new_code(owner, now);
        self.store.insert_code(&code).await?;
        Ok(code)
    }

    pub async fn issue_refresh_token(
        &self,
        owner: &ResourceOwner,
        now: DateTime<Utc>,
    ) -> StoreResult<RefreshToken> {
        let token = self.policy.new_refresh_token(owner, now);
        self.store.insert_refresh_token(&token).await?;
        Ok(token)
    }
}

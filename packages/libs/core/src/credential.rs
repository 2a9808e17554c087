//! 자격증명 모델
//!
//! 저장소에 보관되는 세 종류의 자격증명과 발급 정책입니다.
//!
//! - **Attempt**: 핸드셰이크 챌린지 (TTL 2분, 성공한 Acknowledge에서만 소비)
//! - **AccessCode**: 1회용 코드 (TTL 2분, 토큰 교환에서 정확히 한 번 소비)
//! - **RefreshToken**: 갱신용 토큰 (기본값은 만료 없음, 사용해도 회전하지 않음)
//!
//! 만료는 자격증명에 실린 데이터일 뿐이며, 저장소는 만료를 강제하지 않습니다.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::id;

/// scope가 주어지지 않았을 때의 와일드카드
pub const WILDCARD_SCOPE: &str = "*";

/// 리소스 소유자 (디렉터리 카드 ID + scope)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceOwner {
    /// 외부 디렉터리의 카드 ID
    #[serde(rename = "resource_owner_id")]
    pub id: String,

    /// 호출자가 지정한 scope (불투명 문자열)
    pub scope: String,
}

impl ResourceOwner {
    pub fn new(id: impl Into<String>, scope: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            scope: scope.into(),
        }
    }

    /// scope가 없거나 비어 있으면 `"*"`
    pub fn with_default_scope(id: impl Into<String>, scope: Option<&str>) -> Self {
        let scope = scope
            .filter(|s| !s.is_empty())
            .unwrap_or(WILDCARD_SCOPE);
        Self::new(id, scope)
    }
}

/// 만료 시각을 가진 자격증명
pub trait Expiring {
    fn expires_at(&self) -> DateTime<Utc>;

    /// `now`가 만료 시각을 지났는지
    fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at()
    }
}

/// 핸드셰이크 챌린지
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub id: String,
    pub owner_id: String,
    pub scope: String,

    /// 평문 챌린지 (카드 공개키로 암호화되어 전달됨)
    pub challenge: Vec<u8>,

    pub expires_at: DateTime<Utc>,
}

impl Attempt {
    pub fn owner(&self) -> ResourceOwner {
        ResourceOwner::new(&self.owner_id, &self.scope)
    }
}

impl Expiring for Attempt {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// 1회용 Access Code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessCode {
    pub code: String,
    pub owner_id: String,
    pub scope: String,
    pub used: bool,
    pub expires_at: DateTime<Utc>,
}

impl AccessCode {
    pub fn owner(&self) -> ResourceOwner {
        ResourceOwner::new(&self.owner_id, &self.scope)
    }
}

impl Expiring for AccessCode {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// Refresh Token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshToken {
    pub token: String,
    pub owner_id: String,
    pub scope: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshToken {
    pub fn owner(&self) -> ResourceOwner {
        ResourceOwner::new(&self.owner_id, &self.scope)
    }
}

impl Expiring for RefreshToken {
    fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }
}

/// 만료 없는 Refresh Token의 만료 시각 (2999-01-01T00:00:00Z)
pub fn refresh_token_sentinel() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2999, 1, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// 자격증명 발급 정책
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialPolicy {
    /// Attempt TTL
    pub attempt_ttl: Duration,

    /// AccessCode TTL
    pub code_ttl: Duration,

    /// RefreshToken TTL (`None`이면 만료 없음)
    pub refresh_ttl: Option<Duration>,
}

impl Default for CredentialPolicy {
    fn default() -> Self {
        Self {
            attempt_ttl: Duration::minutes(2),
            code_ttl: Duration::minutes(2),
            refresh_ttl: None,
        }
    }
}

impl CredentialPolicy {
    /// 새 Attempt 생성 (랜덤 ID + 랜덤 챌린지)
    pub fn new_attempt(&self, owner: &ResourceOwner, now: DateTime<Utc>) -> Attempt {
        Attempt {
            id: id::random_token(),
            owner_id: owner.id.clone(),
            scope: owner.scope.clone(),
            challenge: id::random_token().into_bytes(),
            expires_at: now + self.attempt_ttl,
        }
    }

    /// 새 AccessCode 생성
    pub fn new_code(&self, owner: &ResourceOwner, now: DateTime<Utc>) -> AccessCode {
        AccessCode {
            code: id::random_token(),
            owner_id: owner.id.clone(),
            scope: owner.scope.clone(),
            used: false,
            expires_at: now + self.code_ttl,
        }
    }

    /// 새 RefreshToken 생성
    pub fn new_refresh_token(&self, owner: &ResourceOwner, now: DateTime<Utc>) -> RefreshToken {
        // 범위를 넘는 TTL은 만료 없음으로 취급
        let expires_at = self
            .refresh_ttl
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or_else(refresh_token_sentinel);

        RefreshToken {
            token: id::random_token(),
            owner_id: owner.id.clone(),
            scope: owner.scope.clone(),
            expires_at,
        }
    }
}

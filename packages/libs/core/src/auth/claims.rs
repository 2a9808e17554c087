//! 토큰 Claims
//!
//! Bearer 토큰 페이로드 구조입니다.

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::credential::ResourceOwner;

/// 토큰 발급자
pub const ISSUER: &str = "cardauth";

/// Access Token 수명 (초)
pub const ACCESS_TOKEN_TTL_SECS: i64 = 600;

/// Access Token Claims
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// 리소스 소유자 카드 ID
    #[serde(rename = "own")]
    pub owner_id: String,

    /// scope
    pub scope: String,

    /// 발급 시각 (초 단위)
    #[serde(with = "chrono::serde::ts_seconds")]
    pub iat: DateTime<Utc>,

    /// 만료 시각 (초 단위)
    #[serde(with = "chrono::serde::ts_seconds")]
    pub exp: DateTime<Utc>,

    /// 발급자
    pub iss: String,
}

impl AccessTokenClaims {
    /// 새 claims 생성
    ///
    /// 발급 시각은 초 단위로 내림하고, 만료는 발급 후 10분입니다.
    pub fn new(owner: &ResourceOwner, now: DateTime<Utc>) -> Self {
        let iat = now.trunc_subsecs(0);
        Self {
            owner_id: owner.id.clone(),
            scope: owner.scope.clone(),
            iat,
            exp: iat + Duration::seconds(ACCESS_TOKEN_TTL_SECS),
            iss: ISSUER.to_string(),
        }
    }

    /// 만료 여부 확인
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.exp
    }

    /// 토큰 수명 (초)
    pub fn expires_in(&self) -> i64 {
        (self.exp - self.iat).num_seconds()
    }

    pub fn owner(&self) -> ResourceOwner {
        ResourceOwner::new(&self.owner_id, &self.scope)
    }
}

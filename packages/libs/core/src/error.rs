//! 공통 에러 타입
//!
//! 도메인 에러는 값으로 경계까지 전달되고, 전송 상태 코드로의 변환은
//! [`Error::status_code`]와 [`Error::code`] 한 곳에서만 이루어집니다.

use std::fmt::Display;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// 에러 분류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// 잘못된 요청 (호출자 에러)
    Validation,

    /// 대상 없음
    NotFound,

    /// 이미 사용됨 / 만료됨
    StateConflict,

    /// 암호/신원 검증 실패
    Credential,

    /// 저장소, 디렉터리, 코덱 내부 실패
    Infrastructure,
}

/// cardauth 공통 에러
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────────
    // Validation
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("invalid request: {reason}")]
    InvalidRequest { reason: String },

    #[error("unsupported grant type: {grant_type}")]
    UnsupportedGrantType { grant_type: String },

    // ─────────────────────────────────────────────────────────────────────────────
    // Not Found
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("access code not found")]
    CodeNotFound,

    #[error("refresh token not found")]
    RefreshTokenNotFound,

    #[error("authorization grant attempt not found")]
    AttemptNotFound,

    #[error("card not found")]
    CardNotFound,

    // ─────────────────────────────────────────────────────────────────────────────
    // State Conflict
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("access code was already used")]
    CodeWasUsed,

    #[error("access code expired")]
    CodeExpired,

    // ─────────────────────────────────────────────────────────────────────────────
    // Credential / Identity
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("card is protected")]
    CardProtected,

    #[error("card is invalid")]
    CardInvalid,

    #[error("encrypted message validation failed")]
    EncryptedMessageValidationFailed,

    #[error("access token is broken")]
    AccessTokenBroken,

    #[error("access token expired")]
    AccessTokenExpired,

    // ─────────────────────────────────────────────────────────────────────────────
    // Infrastructure
    // ─────────────────────────────────────────────────────────────────────────────
    #[error("internal error in {operation}: {message}")]
    Internal {
        operation: &'static str,
        message: String,
    },
}

impl Error {
    /// 내부 에러 생성
    ///
    /// 내부 에러는 생성 시점에 operation 이름과 원인을 함께 한 번만 기록합니다.
    /// 호출자에게는 [`Error::code`]만 노출됩니다.
    pub fn internal(operation: &'static str, cause: impl Display) -> Self {
        let message = cause.to_string();
        tracing::error!(operation, error = %message, "internal error");
        Error::Internal { operation, message }
    }

    pub fn invalid_request(reason: impl Into<String>) -> Self {
        Error::InvalidRequest {
            reason: reason.into(),
        }
    }

    /// 에러 분류
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidRequest { .. } | Error::UnsupportedGrantType { .. } => {
                ErrorKind::Validation
            }

            Error::CodeNotFound
            | Error::RefreshTokenNotFound
            | Error::AttemptNotFound
            | Error::CardNotFound => ErrorKind::NotFound,

            Error::CodeWasUsed | Error::CodeExpired => ErrorKind::StateConflict,

            Error::CardProtected
            | Error::CardInvalid
            | Error::EncryptedMessageValidationFailed
            | Error::AccessTokenBroken
            | Error::AccessTokenExpired => ErrorKind::Credential,

            Error::Internal { .. } => ErrorKind::Infrastructure,
        }
    }

    /// HTTP 상태 코드로 변환
    ///
    /// 인프라 실패만 500이고 호출자 에러는 모두 400입니다.
    /// 예외는 Attempt 없음(404, 본문 없음) 하나뿐입니다.
    pub fn status_code(&self) -> u16 {
        if matches!(self, Error::AttemptNotFound) {
            return 404;
        }
        match self.kind() {
            ErrorKind::Infrastructure => 500,
            ErrorKind::Validation
            | ErrorKind::NotFound
            | ErrorKind::StateConflict
            | ErrorKind::Credential => 400,
        }
    }

    /// 에러 코드 (클라이언트용)
    ///
    /// `None`이면 응답 본문 없이 상태 코드만 전달합니다.
    pub fn code(&self) -> Option<u32> {
        let code = match self {
            Error::AttemptNotFound => return None,
            Error::InvalidRequest { .. } => 53000,
            Error::CardNotFound => 53010,
            Error::CardProtected => 53011,
            Error::EncryptedMessageValidationFailed => 53020,
            Error::AccessTokenExpired => 53030,
            Error::UnsupportedGrantType { .. } => 53040,
            Error::CodeNotFound => 53050,
            Error::CodeExpired => 53060,
            Error::CodeWasUsed => 53070,
            Error::AccessTokenBroken => 53080,
            Error::RefreshTokenNotFound => 53090,
            Error::CardInvalid => 53100,
            Error::Internal { .. } => 10000,
        };
        Some(code)
    }
}

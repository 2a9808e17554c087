//! HTTP 에러 응답
//!
//! 상태 코드와 본문은 [`cardauth_core::Error`]가 정한 값을 그대로 씁니다.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use cardauth_core::wire::ErrorBody;

/// API 에러
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub cardauth_core::Error);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        match self.0.code() {
            Some(code) => (status, Json(ErrorBody { code })).into_response(),
            None => status.into_response(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

//! HTTP 핸들러
//!
//! 본문은 직접 파싱합니다. 파싱 실패는 엔드포인트마다 정해진 도메인 에러로 응답합니다.

pub mod auth;
pub mod grant;
pub mod health;

use axum::body::Bytes;
use serde::de::DeserializeOwned;

use cardauth_core::Error;

use crate::error::ApiError;

/// JSON 본문 파싱 (실패 시 `on_error`)
fn parse_body<T: DeserializeOwned>(body: &Bytes, on_error: fn() -> Error) -> Result<T, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError(on_error()))
}

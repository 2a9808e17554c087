//! 토큰 엔드포인트

use std::sync::Arc;

use axum::{body::Bytes, extract::State, Json};

use cardauth_core::credential::ResourceOwner;
use cardauth_core::wire::{AccessTokenRequest, RefreshRequest, TokenGrant, VerifyRequest};
use cardauth_core::Error;

use super::parse_body;
use crate::error::Result;
use crate::state::AppState;

/// POST /authorization/actions/obtain-access-token
pub async fn obtain_access_token(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TokenGrant>> {
    let req: AccessTokenRequest = parse_body(&body, || Error::CodeNotFound)?;
    let grant = state.auth.access_token(&req.grant_type, &req.code).await?;
    Ok(Json(grant))
}

/// POST /authorization/actions/refresh-access-token
pub async fn refresh_access_token(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<TokenGrant>> {
    let req: RefreshRequest = parse_body(&body, || Error::RefreshTokenNotFound)?;
    let grant = state.auth.refresh(&req.grant_type, &req.refresh_token).await?;
    Ok(Json(grant))
}

/// POST /authorization/actions/verify
pub async fn verify(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<ResourceOwner>> {
    let req: VerifyRequest = parse_body(&body, || Error::AccessTokenBroken)?;
    let owner = state.auth.verify(&req.access_token).await?;
    Ok(Json(owner))
}

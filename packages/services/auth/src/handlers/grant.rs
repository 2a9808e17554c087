//! 핸드셰이크 엔드포인트

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    Json,
};

use cardauth_core::credential::ResourceOwner;
use cardauth_core::wire::{AcknowledgeRequest, Challenge, CodeGrant, HandshakeRequest};
use cardauth_core::Error;

use super::parse_body;
use crate::error::Result;
use crate::state::AppState;

/// POST /authorization-grant/actions/get-challenge-message
pub async fn get_challenge_message(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Challenge>> {
    let req: HandshakeRequest =
        parse_body(&body, || Error::invalid_request("malformed handshake body"))?;
    let owner = ResourceOwner::with_default_scope(req.resource_owner_id, req.scope.as_deref());
    let challenge = state.grant.handshake(&owner).await?;
    Ok(Json(challenge))
}

/// POST /authorization-grant/{attempt_id}/actions/acknowledge
pub async fn acknowledge(
    State(state): State<Arc<AppState>>,
    Path(attempt_id): Path<String>,
    body: Bytes,
) -> Result<Json<CodeGrant>> {
    let req: AcknowledgeRequest = parse_body(&body, || Error::EncryptedMessageValidationFailed)?;
    let grant = state
        .grant
        .acknowledge(&attempt_id, &req.encrypted_message)
        .await?;
    Ok(Json(grant))
}

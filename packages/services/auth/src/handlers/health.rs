//! 헬스 체크 엔드포인트

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{Map, Value};

use cardauth_core::health::{check_all, overall_status};

use crate::state::AppState;

fn status_code(status: u16) -> StatusCode {
    StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}

/// GET /health/status
pub async fn status(State(state): State<Arc<AppState>>) -> StatusCode {
    let reports = check_all(&state.health).await;
    status_code(overall_status(&reports))
}

/// GET /health/info
pub async fn info(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let reports = check_all(&state.health).await;

    let mut body = Map::new();
    for report in &reports {
        body.insert(report.name.clone(), report.to_json());
    }

    (status_code(overall_status(&reports)), Json(Value::Object(body)))
}

//! 헬스 체크 계약
//!
//! 각 의존 서비스는 [`HealthChecker`]를 구현하고, 서버는 [`check_all`] 결과를
//! `/health/status`, `/health/info`로 노출합니다.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::directory::CardDirectory;

/// 정상 상태 코드
pub const STATUS_OK: u16 = 200;

/// 실패 상태 코드
pub const STATUS_FAILED: u16 = 400;

#[derive(Debug, Error)]
#[error("{name} health check failed: {message}")]
pub struct HealthError {
    pub name: String,
    pub message: String,
}

impl HealthError {
    pub fn new(name: impl Into<String>, message: impl ToString) -> Self {
        Self {
            name: name.into(),
            message: message.to_string(),
        }
    }
}

/// 헬스 체커
#[async_trait]
pub trait HealthChecker: Send + Sync {
    fn name(&self) -> &str;

    /// 실패하면 에러, 성공하면 부가 정보 (예: latency)
    async fn info(&self) -> Result<Map<String, Value>, HealthError>;
}

/// 체커 하나의 결과
#[derive(Debug, Clone, PartialEq)]
pub struct HealthReport {
    pub name: String,
    pub status: u16,
    pub info: Map<String, Value>,
}

impl HealthReport {
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// `{"status": <code>, ...info}`
    pub fn to_json(&self) -> Value {
        let mut info = self.info.clone();
        info.insert("status".to_string(), Value::from(self.status));
        Value::Object(info)
    }
}

/// 모든 체커 실행
pub async fn check_all(checkers: &[Arc<dyn HealthChecker>]) -> Vec<HealthReport> {
    let mut reports = Vec::with_capacity(checkers.len());
    for checker in checkers {
        let report = match checker.info().await {
            Ok(info) => HealthReport {
                name: checker.name().to_string(),
                status: STATUS_OK,
                info,
            },
            Err(e) => {
                tracing::warn!(checker = checker.name(), error = %e, "health check failed");
                HealthReport {
                    name: checker.name().to_string(),
                    status: STATUS_FAILED,
                    info: Map::new(),
                }
            }
        };
        reports.push(report);
    }
    reports
}

/// 전체 상태: 첫 실패 상태, 없으면 200
pub fn overall_status(reports: &[HealthReport]) -> u16 {
    reports
        .iter()
        .find(|report| !report.is_ok())
        .map(|report| report.status)
        .unwrap_or(STATUS_OK)
}

/// 지정한 카드를 조회해 디렉터리 응답 시간을 측정
pub struct DirectoryHealthChecker {
    directory: Arc<dyn CardDirectory>,
    card_id: String,
}

impl DirectoryHealthChecker {
    pub fn new(directory: Arc<dyn CardDirectory>, card_id: impl Into<String>) -> Self {
        Self {
            directory,
            card_id: card_id.into(),
        }
    }
}

#[async_trait]
impl HealthChecker for DirectoryHealthChecker {
    fn name(&self) -> &str {
        "cards-service"
    }

    async fn info(&self) -> Result<Map<String, Value>, HealthError> {
        let start = Instant::now();
        self.directory
            .resolve(&self.card_id)
            .await
            .map_err(|e| HealthError::new(self.name(), e))?;
        Ok(latency_info(start))
    }
}

/// `{"latency": <ms>}`
pub fn latency_info(start: Instant) -> Map<String, Value> {
    let mut info = Map::new();
    info.insert(
        "latency".to_string(),
        Value::from(start.elapsed().as_millis() as u64),
    );
    info
}

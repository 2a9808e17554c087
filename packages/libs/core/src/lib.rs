//! cardauth-core: 카드 기반 인증 프로토콜 엔진
//!
//! 서버, CLI가 공유하는 핵심 타입과 로직을 제공합니다.
//!
//! # 모듈 구조
//!
//! - `auth`: 서명된 Bearer 토큰 코덱과 claims
//! - `credential`: Attempt / AccessCode / RefreshToken 모델과 발급 정책
//! - `store`: 자격증명 저장소 계약 (원자적 redeem 포함)
//! - `flow`: 토큰 교환(AuthFlow)과 챌린지-응답 핸드셰이크(GrantFlow)
//! - `crypto`: 서명/암호화 capability 인터페이스와 Ed25519 어댑터
//! - `directory`: 카드 디렉터리 capability
//! - `health`: 헬스 체크 계약
//! - `wire`: 전송 계층이 그대로 전달하는 요청/응답 본문
//! - `error`: 공통 에러 타입

pub mod auth;
pub mod clock;
pub mod credential;
pub mod crypto;
pub mod directory;
pub mod error;
pub mod flow;
pub mod health;
pub mod id;
pub mod store;
pub mod wire;

#[cfg(test)]
pub(crate) mod fixtures;

pub use error::{Error, ErrorKind, Result};

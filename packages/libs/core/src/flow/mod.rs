//! 인증 흐름
//!
//! - [`AuthFlow`]: Access Code → 토큰 교환, 토큰 갱신, 토큰 검증
//! - [`GrantFlow`]: 카드 챌린지-응답 핸드셰이크로 Access Code 발급
//!
//! 호출 간 공유 상태는 저장소와 시작 시 로드된 키뿐입니다. 각 호출은
//! 시작 시점에 시계를 한 번 읽습니다.

mod auth;
mod grant;

pub use auth::AuthFlow;
pub use grant::GrantFlow;

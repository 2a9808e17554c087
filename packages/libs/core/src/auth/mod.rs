//! Bearer 토큰
//!
//! # 형식
//!
//! `base64url(header) . base64url(claims JSON) . base64url(signature)`
//!
//! - header는 단 하나의 고정 알고리즘 식별자를 담습니다.
//! - 서명은 앞의 두 세그먼트(`header.claims`)에 대해 서버 개인키로 생성합니다.
//! - 유효성은 서명과 만료 비교만으로 판단하며 저장소를 조회하지 않습니다.

mod claims;
mod token;

pub use claims::{AccessTokenClaims, ACCESS_TOKEN_TTL_SECS, ISSUER};
pub use token::{IssuedToken, TokenCodec, TokenError};

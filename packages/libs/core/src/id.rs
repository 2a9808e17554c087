//! 랜덤 식별자 생성
//!
//! Attempt ID, AccessCode, RefreshToken, 챌린지 평문은 모두 OS CSPRNG에서 뽑은
//! 32바이트(256비트)를 base64url(패딩 없음)로 인코딩한 43자 문자열입니다.

use base64::{engine::general_purpose, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;

/// 랜덤 토큰 바이트 수
pub const TOKEN_BYTES: usize = 32;

/// CSPRNG 바이트
pub fn random_bytes<const N: usize>() -> [u8; N] {
    let mut bytes = [0u8; N];
    OsRng.fill_bytes(&mut bytes);
    bytes
}

/// 256비트 랜덤 토큰 (URL-safe)
pub fn random_token() -> String {
    general_purpose::URL_SAFE_NO_PAD.encode(random_bytes::<TOKEN_BYTES>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_random_token_shape() {
        let token = random_token();
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));

        let decoded = general_purpose::URL_SAFE_NO_PAD.decode(&token).unwrap();
        assert_eq!(decoded.len(), TOKEN_BYTES);
    }

    #[test]
    fn test_random_tokens_are_unique() {
        let tokens: HashSet<String> = (0..1000).map(|_| random_token()).collect();
        assert_eq!(tokens.len(), 1000);
    }
}

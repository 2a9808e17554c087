use base64::{engine::general_purpose, Engine as _};

/// 32바이트 키 재료 파싱
///
/// hex(64자), base64url, base64, 또는 정확히 32바이트 원문을 받습니다.
pub fn parse_key_material(raw: &str) -> Option<[u8; 32]> {
    let trimmed = raw.trim();

    if trimmed.len() == 64 && trimmed.chars().all(|c| c.is_ascii_hexdigit()) {
        let bytes = hex::decode(trimmed).ok()?;
        return bytes.as_slice().try_into().ok();
    }

    for engine in [&general_purpose::URL_SAFE_NO_PAD, &general_purpose::STANDARD] {
        if let Ok(bytes) = engine.decode(trimmed) {
            if bytes.len() == 32 {
                return bytes.as_slice().try_into().ok();
            }
        }
    }

    let raw_bytes = trimmed.as_bytes();
    if raw_bytes.len() == 32 {
        return raw_bytes.try_into().ok();
    }

    None
}

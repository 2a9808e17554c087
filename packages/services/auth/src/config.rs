//! 서버 설정

use std::env;
use std::fmt;
use std::path::PathBuf;

use chrono::Duration;

/// 카드 디렉터리 위치
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectorySource {
    /// 원격 디렉터리 서비스
    Remote { url: String, token: Option<String> },

    /// `{"<card id>": "<public key>"}` JSON 파일 (로컬 개발용)
    File(PathBuf),
}

/// 카드 서명 권한자
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorityConfig {
    pub card_id: String,
    pub public_key: String,
}

/// 서버 설정
#[derive(Clone)]
pub struct Config {
    /// 서버 포트
    pub port: u16,

    /// SQLite URL
    pub db_url: String,

    /// 서버 개인키 (hex / base64url / base64)
    pub private_key: String,

    pub directory: DirectorySource,

    /// 설정되면 카드에 권한자 서명이 있어야 함
    pub authority: Option<AuthorityConfig>,

    /// 디렉터리 헬스 체크에서 조회할 카드
    pub health_card_id: Option<String>,

    /// Refresh Token TTL. 없으면 만료 없음
    pub refresh_token_ttl: Option<Duration>,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("db_url", &self.db_url)
            .field("private_key", &"<redacted>")
            .field("directory", &self.directory)
            .field("authority", &self.authority)
            .field("health_card_id", &self.health_card_id)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .finish()
    }
}

impl Config {
    /// 환경변수에서 설정 로드
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let directory = match (var("CARDAUTH_DIRECTORY_URL"), var("CARDAUTH_DIRECTORY_FILE")) {
            (Some(url), _) => DirectorySource::Remote {
                url: url.trim_end_matches('/').to_string(),
                token: var("CARDAUTH_DIRECTORY_TOKEN"),
            },
            (None, Some(path)) => DirectorySource::File(PathBuf::from(path)),
            (None, None) => anyhow::bail!(
                "CARDAUTH_DIRECTORY_URL or CARDAUTH_DIRECTORY_FILE must be set"
            ),
        };

        let authority = match (
            var("CARDAUTH_AUTHORITY_CARD_ID"),
            var("CARDAUTH_AUTHORITY_PUBLIC_KEY"),
        ) {
            (Some(card_id), Some(public_key)) => Some(AuthorityConfig {
                card_id,
                public_key,
            }),
            (None, None) => None,
            _ => anyhow::bail!(
                "CARDAUTH_AUTHORITY_CARD_ID and CARDAUTH_AUTHORITY_PUBLIC_KEY must be set together"
            ),
        };

        let refresh_token_ttl = var("CARDAUTH_REFRESH_TOKEN_TTL_SECS")
            .map(|v| parse_ttl_secs(&v))
            .transpose()?;

        Ok(Self {
            port: var("CARDAUTH_PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse()?,

            db_url: var("CARDAUTH_DB_URL")
                .unwrap_or_else(|| "sqlite://data/cardauth.db".to_string()),

            private_key: var("CARDAUTH_PRIVATE_KEY")
                .ok_or_else(|| anyhow::anyhow!("CARDAUTH_PRIVATE_KEY must be set"))?,

            directory,
            authority,
            health_card_id: var("CARDAUTH_HEALTH_CARD_ID"),
            refresh_token_ttl,
        })
    }
}

/// 양수 초 단위 TTL
fn parse_ttl_secs(value: &str) -> anyhow::Result<Duration> {
    let secs: i64 = value.trim().parse()?;
    if secs <= 0 {
        anyhow::bail!("CARDAUTH_REFRESH_TOKEN_TTL_SECS must be positive, got {secs}");
    }
    Duration::try_seconds(secs)
        .ok_or_else(|| anyhow::anyhow!("CARDAUTH_REFRESH_TOKEN_TTL_SECS is out of range: {secs}"))
}

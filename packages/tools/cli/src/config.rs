//! CLI 설정
//!
//! 로그인 결과는 `~/.cardauth/config.json`에 저장됩니다.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// CLI 설정
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// 기본 서버 URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_url: Option<String>,

    /// 마지막으로 로그인한 카드
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl CliConfig {
    /// 설정 파일 경로
    pub fn config_path() -> anyhow::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Cannot find home directory"))?;
        Ok(home.join(".cardauth").join("config.json"))
    }

    /// 설정 로드
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// 설정 저장
    pub fn save(&self) -> anyhow::Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// 서버 URL 결정 (명령행 > 저장된 값)
    pub fn server_url(&self, cli: Option<&str>) -> anyhow::Result<String> {
        cli.map(str::to_string)
            .or_else(|| self.server_url.clone())
            .map(|url| url.trim_end_matches('/').to_string())
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Server URL not configured. Use '--server <url>' or set CARDAUTH_SERVER_URL"
                )
            })
    }

    pub fn access_token(&self) -> anyhow::Result<String> {
        self.access_token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("Not logged in. Use 'cardauth login' first."))
    }

    pub fn refresh_token(&self) -> anyhow::Result<String> {
        self.refresh_token
            .clone()
            .ok_or_else(|| anyhow::anyhow!("No refresh token. Use 'cardauth login' first."))
    }

    /// 토큰 삭제 (서버 URL은 유지)
    pub fn clear_session(&mut self) {
        self.card_id = None;
        self.access_token = None;
        self.refresh_token = None;
    }
}

//! SQLite 자격증명 저장소
//!
//! 1회용 자격증명 소비는 각각 SQL 문 하나로 끝납니다.
//! - AccessCode: `UPDATE ... WHERE used = 0 RETURNING`
//! - Attempt: `DELETE ... RETURNING`
//!
//! Refresh Token은 SHA-256 해시로만 보관합니다.

use std::str::FromStr;
use std::time::Instant;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Row, SqlitePool};

use cardauth_core::credential::{AccessCode, Attempt, RefreshToken};
use cardauth_core::health::{latency_info, HealthChecker, HealthError};
use cardauth_core::store::{CredentialStore, Redemption, StoreError, StoreResult};

#[derive(Clone)]
pub struct SqliteCredentialStore {
    pool: SqlitePool,
}

impl SqliteCredentialStore {
    pub async fn connect(db_url: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(db_url)?.create_if_missing(true);

        // 메모리 DB는 연결마다 별개이므로 연결 하나만 사용
        let in_memory = db_url.contains(":memory:");
        if !in_memory {
            if let Some(parent) = options.get_filename().parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent)?;
                }
            }
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init().await?;
        Ok(store)
    }

    async fn init(&self) -> anyhow::Result<()> {
        let queries = [
            r#"CREATE TABLE IF NOT EXISTS attempts (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                scope TEXT NOT NULL,
                challenge BLOB NOT NULL,
                expires_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS access_codes (
                code TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                scope TEXT NOT NULL,
                used INTEGER NOT NULL DEFAULT 0,
                expires_at TEXT NOT NULL
            );"#,
            r#"CREATE TABLE IF NOT EXISTS refresh_tokens (
                token_hash TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                scope TEXT NOT NULL,
                expires_at TEXT NOT NULL,
                created_at TEXT NOT NULL
            );"#,
        ];

        for q in queries {
            sqlx::query(q).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    #[cfg(test)]
    pub async fn refresh_token_count(&self) -> StoreResult<i64> {
        sqlx::query_scalar("SELECT COUNT(*) FROM refresh_tokens")
            .fetch_one(&self.pool)
            .await
            .map_err(store_error)
    }
}

fn store_error(e: sqlx::Error) -> StoreError {
    match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => StoreError::Duplicate,
        _ => StoreError::Unavailable(e.to_string()),
    }
}

fn token_hash(token: &str) -> String {
    hex::encode(Sha256::digest(token.as_bytes()))
}

fn parse_time(row: &SqliteRow, column: &str) -> StoreResult<DateTime<Utc>> {
    let raw: String = row.try_get(column).map_err(store_error)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("{column}: {e}")))
}

fn attempt_from_row(row: &SqliteRow) -> StoreResult<Attempt> {
    Ok(Attempt {
        id: row.try_get("id").map_err(store_error)?,
        owner_id: row.try_get("owner_id").map_err(store_error)?,
        scope: row.try_get("scope").map_err(store_error)?,
        challenge: row.try_get("challenge").map_err(store_error)?,
        expires_at: parse_time(row, "expires_at")?,
    })
}

fn code_from_row(row: &SqliteRow) -> StoreResult<AccessCode> {
    Ok(AccessCode {
        code: row.try_get("code").map_err(store_error)?,
        owner_id: row.try_get("owner_id").map_err(store_error)?,
        scope: row.try_get("scope").map_err(store_error)?,
        used: row.try_get("used").map_err(store_error)?,
        expires_at: parse_time(row, "expires_at")?,
    })
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn insert_attempt(&self, attempt: &Attempt) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO attempts (id, owner_id, scope, challenge, expires_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&attempt.id)
        .bind(&attempt.owner_id)
        .bind(&attempt.scope)
        .bind(&attempt.challenge)
        .bind(attempt.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn find_attempt(&self, id: &str) -> StoreResult<Option<Attempt>> {
        let row = sqlx::query(
            "SELECT id, owner_id, scope, challenge, expires_at FROM attempts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(attempt_from_row).transpose()
    }

    async fn take_attempt(&self, id: &str) -> StoreResult<Option<Attempt>> {
        let row = sqlx::query(
            "DELETE FROM attempts WHERE id = ? \
             RETURNING id, owner_id, scope, challenge, expires_at",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        row.as_ref().map(attempt_from_row).transpose()
    }

    async fn insert_code(&self, code: &AccessCode) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO access_codes (code, owner_id, scope, used, expires_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&code.code)
        .bind(&code.owner_id)
        .bind(&code.scope)
        .bind(code.used)
        .bind(code.expires_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn redeem_code(&self, code: &str) -> StoreResult<Redemption<AccessCode>> {
        let row = sqlx::query(
            "UPDATE access_codes SET used = 1 WHERE code = ? AND used = 0 \
             RETURNING code, owner_id, scope, used, expires_at",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        if let Some(row) = row {
            return Ok(Redemption::Redeemed(code_from_row(&row)?));
        }

        // 소비는 위에서 끝났고, 여기서는 실패 원인만 구분
        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM access_codes WHERE code = ?")
            .bind(code)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?;

        Ok(match exists {
            Some(_) => Redemption::AlreadyUsed,
            None => Redemption::NotFound,
        })
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO refresh_tokens (token_hash, owner_id, scope, expires_at, created_at) \
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(token_hash(&token.token))
        .bind(&token.owner_id)
        .bind(&token.scope)
        .bind(token.expires_at.to_rfc3339())
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(store_error)?;
        Ok(())
    }

    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        let row = sqlx::query(
            "SELECT owner_id, scope, expires_at FROM refresh_tokens WHERE token_hash = ?",
        )
        .bind(token_hash(token))
        .fetch_optional(&self.pool)
        .await
        .map_err(store_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        Ok(Some(RefreshToken {
            token: token.to_string(),
            owner_id: row.try_get("owner_id").map_err(store_error)?,
            scope: row.try_get("scope").map_err(store_error)?,
            expires_at: parse_time(&row, "expires_at")?,
        }))
    }
}

/// SQLite 연결 헬스 체크
pub struct SqliteHealthChecker {
    pool: SqlitePool,
}

impl SqliteHealthChecker {
    pub fn new(store: &SqliteCredentialStore) -> Self {
        Self {
            pool: store.pool().clone(),
        }
    }
}

#[async_trait]
impl HealthChecker for SqliteHealthChecker {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn info(&self) -> Result<Map<String, Value>, HealthError> {
        let start = Instant::now();
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| HealthError::new(self.name(), e))?;
        Ok(latency_info(start))
    }
}

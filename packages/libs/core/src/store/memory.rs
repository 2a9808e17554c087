//! 메모리 저장소
//!
//! 종류별 `Mutex<HashMap>`을 사용합니다. 소비 연산은 락 한 번 안에서
//! 확인과 변경을 함께 수행합니다.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use super::{CredentialStore, Redemption, StoreError, StoreResult};
use crate::credential::{AccessCode, Attempt, RefreshToken};

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    attempts: Mutex<HashMap<String, Attempt>>,
    codes: Mutex<HashMap<String, AccessCode>>,
    refresh_tokens: Mutex<HashMap<String, RefreshToken>>,
}

fn lock<T>(mutex: &Mutex<T>) -> StoreResult<MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| StoreError::Unavailable("memory store lock poisoned".to_string()))
}

fn insert_new<T>(map: &mut HashMap<String, T>, key: &str, value: T) -> StoreResult<()> {
    match map.entry(key.to_string()) {
        Entry::Occupied(_) => Err(StoreError::Duplicate),
        Entry::Vacant(slot) => {
            slot.insert(value);
            Ok(())
        }
    }
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 저장된 RefreshToken 수
    pub fn refresh_token_count(&self) -> StoreResult<usize> {
        Ok(lock(&self.refresh_tokens)?.len())
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_attempt(&self, attempt: &Attempt) -> StoreResult<()> {
        insert_new(&mut *lock(&self.attempts)?, &attempt.id, attempt.clone())
    }

    async fn find_attempt(&self, id: &str) -> StoreResult<Option<Attempt>> {
        Ok(lock(&self.attempts)?.get(id).cloned())
    }

    async fn take_attempt(&self, id: &str) -> StoreResult<Option<Attempt>> {
        Ok(lock(&self.attempts)?.remove(id))
    }

    async fn insert_code(&self, code: &AccessCode) -> StoreResult<()> {
        insert_new(&mut *lock(&self.codes)?, &code.code, code.clone())
    }

    async fn redeem_code(&self, code: &str) -> StoreResult<Redemption<AccessCode>> {
        let mut codes = lock(&self.codes)?;
        let Some(stored) = codes.get_mut(code) else {
            return Ok(Redemption::NotFound);
        };
        if stored.used {
            return Ok(Redemption::AlreadyUsed);
        }
        stored.used = true;
        Ok(Redemption::Redeemed(stored.clone()))
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> StoreResult<()> {
        insert_new(
            &mut *lock(&self.refresh_tokens)?,
            &token.token,
            token.clone(),
        )
    }

    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        Ok(lock(&self.refresh_tokens)?.get(token).cloned())
    }
}

//! 테스트 공용 구성

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};

use crate::auth::TokenCodec;
use crate::clock::{Clock, ManualClock};
use crate::credential::{AccessCode, Attempt, CredentialPolicy, RefreshToken, ResourceOwner};
use crate::crypto::{CryptoCapability, DalekCrypto, PrivateKey, PublicKey};
use crate::directory::{CardDirectory, DirectoryError, StaticCardDirectory};
use crate::flow::{AuthFlow, GrantFlow};
use crate::store::{
    CredentialStore, Credentials, MemoryCredentialStore, Redemption, StoreError, StoreResult,
};
use crate::wire::Challenge;

/// 항상 같은 에러를 돌려주는 디렉터리
pub struct FailingDirectory {
    error: DirectoryError,
}

impl FailingDirectory {
    pub fn new(error: DirectoryError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl CardDirectory for FailingDirectory {
    async fn resolve(&self, _card_id: &str) -> Result<PublicKey, DirectoryError> {
        Err(self.error.clone())
    }
}

/// 저장소 연산
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    InsertAttempt,
    FindAttempt,
    TakeAttempt,
    InsertCode,
    RedeemCode,
    InsertRefreshToken,
    FindRefreshToken,
}

impl StoreOp {
    pub const ALL: [StoreOp; 7] = [
        StoreOp::InsertAttempt,
        StoreOp::FindAttempt,
        StoreOp::TakeAttempt,
        StoreOp::InsertCode,
        StoreOp::RedeemCode,
        StoreOp::InsertRefreshToken,
        StoreOp::FindRefreshToken,
    ];
}

/// 지정한 연산만 `Unavailable`로 실패시키고 나머지는 메모리 저장소에 위임
pub struct FailingStore {
    inner: Arc<MemoryCredentialStore>,
    failing: Mutex<HashSet<StoreOp>>,
}

impl FailingStore {
    pub fn new(inner: Arc<MemoryCredentialStore>) -> Self {
        Self {
            inner,
            failing: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail(&self, ops: &[StoreOp]) {
        self.failing.lock().unwrap().extend(ops.iter().copied());
    }

    fn check(&self, op: StoreOp) -> StoreResult<()> {
        if self.failing.lock().unwrap().contains(&op) {
            Err(StoreError::Unavailable(format!("{op:?} refused")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CredentialStore for FailingStore {
    async fn insert_attempt(&self, attempt: &Attempt) -> StoreResult<()> {
        self.check(StoreOp::InsertAttempt)?;
        self.inner.insert_attempt(attempt).await
    }

    async fn find_attempt(&self, id: &str) -> StoreResult<Option<Attempt>> {
        self.check(StoreOp::FindAttempt)?;
        self.inner.find_attempt(id).await
    }

    async fn take_attempt(&self, id: &str) -> StoreResult<Option<Attempt>> {
        self.check(StoreOp::TakeAttempt)?;
        self.inner.take_attempt(id).await
    }

    async fn insert_code(&self, code: &AccessCode) -> StoreResult<()> {
        self.check(StoreOp::InsertCode)?;
        self.inner.insert_code(code).await
    }

    async fn redeem_code(&self, code: &str) -> StoreResult<Redemption<AccessCode>> {
        self.check(StoreOp::RedeemCode)?;
        self.inner.redeem_code(code).await
    }

    async fn insert_refresh_token(&self, token: &RefreshToken) -> StoreResult<()> {
        self.check(StoreOp::InsertRefreshToken)?;
        self.inner.insert_refresh_token(token).await
    }

    async fn find_refresh_token(&self, token: &str) -> StoreResult<Option<RefreshToken>> {
        self.check(StoreOp::FindRefreshToken)?;
        self.inner.find_refresh_token(token).await
    }
}

/// 메모리 저장소 + 수동 시계 위에 구성한 두 흐름
pub struct Harness {
    pub clock: Arc<ManualClock>,
    pub store: Arc<MemoryCredentialStore>,
    /// 흐름이 실제로 사용하는 저장소 (`store`를 감쌈)
    pub faults: Arc<FailingStore>,
    pub cards: Arc<StaticCardDirectory>,
    pub crypto: Arc<dyn CryptoCapability>,
    pub server_public: PublicKey,
    pub credentials: Credentials,
    pub auth: AuthFlow,
    pub grant: GrantFlow,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(CredentialPolicy::default(), None)
    }

    pub fn with_policy(policy: CredentialPolicy) -> Self {
        Self::build(policy, None)
    }

    pub fn with_directory(directory: Arc<dyn CardDirectory>) -> Self {
        Self::build(CredentialPolicy::default(), Some(directory))
    }

    fn build(policy: CredentialPolicy, directory: Option<Arc<dyn CardDirectory>>) -> Self {
        // 초 단위로 떨어지는 시각에서 시작해야 토큰 만료 경계가 정확함
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap();
        let clock = Arc::new(ManualClock::new(start));
        let store = Arc::new(MemoryCredentialStore::new());
        let cards = Arc::new(StaticCardDirectory::new());
        let crypto: Arc<dyn CryptoCapability> = Arc::new(DalekCrypto::new());

        let server_key = crypto.generate_private_key().unwrap();
        let server_public = crypto.extract_public_key(&server_key).unwrap();
        let faults = Arc::new(FailingStore::new(store.clone()));
        let credentials = Credentials::new(faults.clone(), policy);
        let codec = Arc::new(TokenCodec::new(crypto.clone(), server_key.clone()).unwrap());

        let directory = directory.unwrap_or_else(|| cards.clone() as Arc<dyn CardDirectory>);
        let auth = AuthFlow::new(credentials.clone(), codec, clock.clone());
        let grant = GrantFlow::new(
            directory,
            credentials.clone(),
            crypto.clone(),
            server_key,
            clock.clone(),
        );

        Self {
            clock,
            store,
            faults,
            cards,
            crypto,
            server_public,
            credentials,
            auth,
            grant,
        }
    }

    /// 새 카드 키를 만들어 디렉터리에 등록
    pub fn enroll(&self, card_id: &str) -> PrivateKey {
        let key = self.crypto.generate_private_key().unwrap();
        self.cards
            .insert(card_id, self.crypto.extract_public_key(&key).unwrap());
        key
    }

    /// 카드 쪽 응답: 챌린지를 복호화해 서버 공개키로 다시 암호화
    pub fn answer(&self, card: &PrivateKey, challenge: &Challenge) -> Vec<u8> {
        let plain = self
            .crypto
            .decrypt(&challenge.encrypted_message, card)
            .unwrap();
        self.crypto.encrypt(&plain, &self.server_public).unwrap()
    }

    /// 현재 시각 기준으로 Access Code 발급
    pub async fn issue_code(&self, owner: &ResourceOwner) -> String {
        self.credentials
            .issue_code(owner, self.clock.now())
            .await
            .unwrap()
            .code
    }
}

//! 앱 상태

use std::sync::Arc;

use anyhow::Context;
use base64::{engine::general_purpose, Engine as _};

use cardauth_core::auth::TokenCodec;
use cardauth_core::clock::{Clock, SystemClock};
use cardauth_core::credential::CredentialPolicy;
use cardauth_core::crypto::{parse_key_material, CryptoCapability, DalekCrypto};
use cardauth_core::directory::{CardDirectory, StaticCardDirectory};
use cardauth_core::flow::{AuthFlow, GrantFlow};
use cardauth_core::health::{DirectoryHealthChecker, HealthChecker};
use cardauth_core::store::Credentials;

use crate::config::{AuthorityConfig, Config, DirectorySource};
use crate::db::{SqliteCredentialStore, SqliteHealthChecker};
use crate::directory::{Authority, HttpCardDirectory};

/// 앱 상태
///
/// 모든 핸들러에서 공유하는 상태입니다. 키와 흐름은 시작 시 한 번 구성되고
/// 이후에는 읽기만 합니다.
pub struct AppState {
    pub auth: AuthFlow,
    pub grant: GrantFlow,
    pub health: Vec<Arc<dyn HealthChecker>>,
}

impl AppState {
    /// 설정으로부터 상태 구성
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        let crypto: Arc<dyn CryptoCapability> = Arc::new(DalekCrypto::new());

        let material = parse_key_material(&config.private_key)
            .context("CARDAUTH_PRIVATE_KEY must be 32 bytes (hex, base64url or base64)")?;
        let server_key = crypto.import_private_key(&material)?;
        let server_public = crypto.extract_public_key(&server_key)?;
        tracing::info!(
            fingerprint = %crypto.fingerprint(&server_public),
            public_key =
                %general_purpose::STANDARD.encode(crypto.export_public_key(&server_public)),
            "server key loaded"
        );

        let store = SqliteCredentialStore::connect(&config.db_url).await?;
        let directory = build_directory(config, crypto.clone())?;

        let policy = CredentialPolicy {
            refresh_ttl: config.refresh_token_ttl,
            ..CredentialPolicy::default()
        };
        let credentials = Credentials::new(Arc::new(store.clone()), policy);
        let codec = Arc::new(TokenCodec::new(crypto.clone(), server_key.clone())?);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        let mut health: Vec<Arc<dyn HealthChecker>> =
            vec![Arc::new(SqliteHealthChecker::new(&store))];
        if let Some(card_id) = &config.health_card_id {
            health.push(Arc::new(DirectoryHealthChecker::new(
                directory.clone(),
                card_id.clone(),
            )));
        }

        Ok(Self::from_parts(
            AuthFlow::new(credentials.clone(), codec, clock.clone()),
            GrantFlow::new(directory, credentials, crypto, server_key, clock),
            health,
        ))
    }

    pub fn from_parts(
        auth: AuthFlow,
        grant: GrantFlow,
        health: Vec<Arc<dyn HealthChecker>>,
    ) -> Self {
        Self {
            auth,
            grant,
            health,
        }
    }
}

fn build_directory(
    config: &Config,
    crypto: Arc<dyn CryptoCapability>,
) -> anyhow::Result<Arc<dyn CardDirectory>> {
    match &config.directory {
        DirectorySource::Remote { url, token } => {
            let authority = config
                .authority
                .as_ref()
                .map(|authority| load_authority(authority, crypto.as_ref()))
                .transpose()?;
            tracing::info!(
                url = %url,
                authority = authority.is_some(),
                "using remote card directory"
            );
            Ok(Arc::new(HttpCardDirectory::new(
                url.clone(),
                token.clone(),
                crypto,
                authority,
            )))
        }
        DirectorySource::File(path) => {
            let directory = StaticCardDirectory::from_file(path, crypto.as_ref())?;
            tracing::info!(
                path = %path.display(),
                cards = directory.len(),
                "using static card directory"
            );
            Ok(Arc::new(directory))
        }
    }
}

fn load_authority(
    authority: &AuthorityConfig,
    crypto: &dyn CryptoCapability,
) -> anyhow::Result<Authority> {
    let material = parse_key_material(&authority.public_key)
        .context("CARDAUTH_AUTHORITY_PUBLIC_KEY must be 32 bytes (hex, base64url or base64)")?;
    Ok(Authority {
        card_id: authority.card_id.clone(),
        public_key: crypto.import_public_key(&material)?,
    })
}

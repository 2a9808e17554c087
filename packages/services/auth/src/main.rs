//! cardauth 인증 서버
//!
//! 카드 핸드셰이크로 Access Code를 발급하고, 이를 Bearer 토큰으로 교환합니다.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod db;
mod directory;
mod error;
mod handlers;
mod middleware;
mod state;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 환경변수 로드
    dotenvy::dotenv().ok();

    // 로깅 초기화
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "cardauth_server=debug,cardauth_core=info,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 설정 로드
    let config = Config::from_env()?;
    tracing::info!("Starting cardauth server with config: {:?}", config);

    // 앱 상태 초기화
    let state = Arc::new(AppState::new(&config).await?);

    // 라우터 구성
    let app = create_router(state);

    // 서버 시작
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("cardauth server listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// 라우터 생성
fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Token
        .route(
            "/authorization/actions/obtain-access-token",
            post(handlers::auth::obtain_access_token),
        )
        .route(
            "/authorization/actions/refresh-access-token",
            post(handlers::auth::refresh_access_token),
        )
        .route("/authorization/actions/verify", post(handlers::auth::verify))
        // Handshake
        .route(
            "/authorization-grant/actions/get-challenge-message",
            post(handlers::grant::get_challenge_message),
        )
        .route(
            "/authorization-grant/{attempt_id}/actions/acknowledge",
            post(handlers::grant::acknowledge),
        )
        // Health check
        .route("/health/status", get(handlers::health::status))
        .route("/health/info", get(handlers::health::info))
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(middleware::request_id))
        // State
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use base64::{engine::general_purpose, Engine as _};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use cardauth_core::auth::TokenCodec;
    use cardauth_core::clock::{Clock, SystemClock};
    use cardauth_core::credential::CredentialPolicy;
    use cardauth_core::crypto::{CryptoCapability, DalekCrypto, PrivateKey, PublicKey};
    use cardauth_core::directory::StaticCardDirectory;
    use cardauth_core::flow::{AuthFlow, GrantFlow};
    use cardauth_core::health::HealthChecker;
    use cardauth_core::store::Credentials;

    use super::*;
    use crate::db::{SqliteCredentialStore, SqliteHealthChecker};

    struct TestApp {
        router: Router,
        crypto: Arc<dyn CryptoCapability>,
        server_public: PublicKey,
        cards: Arc<StaticCardDirectory>,
    }

    impl TestApp {
        async fn new() -> Self {
            let crypto: Arc<dyn CryptoCapability> = Arc::new(DalekCrypto::new());
            let server_key = crypto.generate_private_key().unwrap();
            let server_public = crypto.extract_public_key(&server_key).unwrap();

            let store = SqliteCredentialStore::connect("sqlite::memory:").await.unwrap();
            let cards = Arc::new(StaticCardDirectory::new());
            let credentials =
                Credentials::new(Arc::new(store.clone()), CredentialPolicy::default());
            let codec = Arc::new(TokenCodec::new(crypto.clone(), server_key.clone()).unwrap());
            let clock: Arc<dyn Clock> = Arc::new(SystemClock);
            let health: Vec<Arc<dyn HealthChecker>> =
                vec![Arc::new(SqliteHealthChecker::new(&store))];

            let state = AppState::from_parts(
                AuthFlow::new(credentials.clone(), codec, clock.clone()),
                GrantFlow::new(cards.clone(), credentials, crypto.clone(), server_key, clock),
                health,
            );

            Self {
                router: create_router(Arc::new(state)),
                crypto,
                server_public,
                cards,
            }
        }

        fn enroll(&self, card_id: &str) -> PrivateKey {
            let key = self.crypto.generate_private_key().unwrap();
            self.cards
                .insert(card_id, self.crypto.extract_public_key(&key).unwrap());
            key
        }

        async fn call(&self, method: &str, uri: &str, body: &str) -> (StatusCode, Vec<u8>) {
            let request = Request::builder()
                .method(method)
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap();

            let response = self.router.clone().oneshot(request).await.unwrap();
            let status = response.status();
            let bytes = response.into_body().collect().await.unwrap().to_bytes();
            (status, bytes.to_vec())
        }

        async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
            let (status, bytes) = self.call("POST", uri, &body.to_string()).await;
            let value = if bytes.is_empty() {
                Value::Null
            } else {
                serde_json::from_slice(&bytes).unwrap()
            };
            (status, value)
        }

        /// 핸드셰이크부터 Access Code 발급까지
        async fn login(&self, card_id: &str, card: &PrivateKey) -> String {
            let (status, challenge) = self
                .post(
                    "/authorization-grant/actions/get-challenge-message",
                    json!({"resource_owner_id": card_id}),
                )
                .await;
            assert_eq!(status, StatusCode::OK);

            let attempt_id = challenge["authorization_grant_id"].as_str().unwrap();
            let sealed = general_purpose::STANDARD
                .decode(challenge["encrypted_message"].as_str().unwrap())
                .unwrap();
            let plain = self.crypto.decrypt(&sealed, card).unwrap();
            let answer = self.crypto.encrypt(&plain, &self.server_public).unwrap();

            let (status, grant) = self
                .post(
                    &format!("/authorization-grant/{attempt_id}/actions/acknowledge"),
                    json!({"encrypted_message": general_purpose::STANDARD.encode(answer)}),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            grant["code"].as_str().unwrap().to_string()
        }
    }

    #[tokio::test]
    async fn test_full_flow() {
        let app = TestApp::new().await;
        let card = app.enroll("alice-card");
        let code = app.login("alice-card", &card).await;

        let (status, tokens) = app
            .post(
                "/authorization/actions/obtain-access-token",
                json!({"grant_type": "access_code", "code": code}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tokens["expires_in"], 600);
        assert_eq!(tokens["token_type"], "bearer");

        let (status, owner) = app
            .post(
                "/authorization/actions/verify",
                json!({"access_token": tokens["access_token"]}),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(owner, json!({"resource_owner_id": "alice-card", "scope": "*"}));

        for _ in 0..2 {
            let (status, refreshed) = app
                .post(
                    "/authorization/actions/refresh-access-token",
                    json!({
                        "grant_type": "refresh_token",
                        "refresh_token": tokens["refresh_token"],
                    }),
                )
                .await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(refreshed["expires_in"], 600);
            assert!(refreshed.get("refresh_token").is_none());
            assert!(refreshed.get("token_type").is_none());
        }

        // 코드 재사용
        let (status, body) = app
            .post(
                "/authorization/actions/obtain-access-token",
                json!({"grant_type": "access_code", "code": code}),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"code": 53070}));
    }

    #[tokio::test]
    async fn test_error_bodies() {
        let app = TestApp::new().await;

        let cases = [
            (
                "/authorization/actions/obtain-access-token",
                json!({"grant_type": "password", "code": "x"}),
                53040,
            ),
            (
                "/authorization/actions/obtain-access-token",
                json!({"grant_type": "access_code", "code": "unknown"}),
                53050,
            ),
            (
                "/authorization/actions/refresh-access-token",
                json!({"grant_type": "refresh_token", "refresh_token": "unknown"}),
                53090,
            ),
            (
                "/authorization/actions/verify",
                json!({"access_token": "garbage-not-a-token"}),
                53080,
            ),
            (
                "/authorization-grant/actions/get-challenge-message",
                json!({"resource_owner_id": "nobody-card"}),
                53010,
            ),
            (
                "/authorization-grant/actions/get-challenge-message",
                json!({"resource_owner_id": ""}),
                53000,
            ),
        ];

        for (uri, body, code) in cases {
            let (status, response) = app.post(uri, body).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            assert_eq!(response, json!({"code": code}), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_malformed_bodies() {
        let app = TestApp::new().await;
        app.enroll("alice-card");

        let (_, challenge) = app
            .post(
                "/authorization-grant/actions/get-challenge-message",
                json!({"resource_owner_id": "alice-card"}),
            )
            .await;
        let attempt_id = challenge["authorization_grant_id"].as_str().unwrap();
        let acknowledge = format!("/authorization-grant/{attempt_id}/actions/acknowledge");

        let cases = [
            ("/authorization/actions/obtain-access-token", 53050),
            ("/authorization/actions/refresh-access-token", 53090),
            ("/authorization/actions/verify", 53080),
            ("/authorization-grant/actions/get-challenge-message", 53000),
            (acknowledge.as_str(), 53020),
        ];

        for (uri, code) in cases {
            let (status, bytes) = app.call("POST", uri, "{not json").await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
            let body: Value = serde_json::from_slice(&bytes).unwrap();
            assert_eq!(body, json!({"code": code}), "{uri}");
        }
    }

    #[tokio::test]
    async fn test_unknown_attempt_is_bare_404() {
        let app = TestApp::new().await;
        let (status, bytes) = app
            .call(
                "POST",
                "/authorization-grant/missing/actions/acknowledge",
                &json!({"encrypted_message": general_purpose::STANDARD.encode(b"whatever")})
                    .to_string(),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn test_wrong_answer_keeps_attempt() {
        let app = TestApp::new().await;
        let card = app.enroll("alice-card");

        let (_, challenge) = app
            .post(
                "/authorization-grant/actions/get-challenge-message",
                json!({"resource_owner_id": "alice-card", "scope": "read"}),
            )
            .await;
        let attempt_id = challenge["authorization_grant_id"].as_str().unwrap();
        let uri = format!("/authorization-grant/{attempt_id}/actions/acknowledge");

        let wrong = app.crypto.encrypt(b"guess", &app.server_public).unwrap();
        let (status, body) = app
            .post(&uri, json!({"encrypted_message": general_purpose::STANDARD.encode(wrong)}))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({"code": 53020}));

        let sealed = general_purpose::STANDARD
            .decode(challenge["encrypted_message"].as_str().unwrap())
            .unwrap();
        let plain = app.crypto.decrypt(&sealed, &card).unwrap();
        let answer = app.crypto.encrypt(&plain, &app.server_public).unwrap();
        let (status, grant) = app
            .post(&uri, json!({"encrypted_message": general_purpose::STANDARD.encode(answer)}))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert!(grant["code"].is_string());
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        let app = TestApp::new().await;

        let (status, _) = app.call("GET", "/health/status", "").await;
        assert_eq!(status, StatusCode::OK);

        let (status, bytes) = app.call("GET", "/health/info", "").await;
        assert_eq!(status, StatusCode::OK);
        let info: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(info["sqlite"]["status"], 200);
        assert!(info["sqlite"]["latency"].is_u64());
    }

    #[tokio::test]
    async fn test_request_id_header() {
        let app = TestApp::new().await;
        let request = Request::builder()
            .method("GET")
            .uri("/health/status")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap();

        let response = app.router.clone().oneshot(request).await.unwrap();
        assert_eq!(response.headers()["x-request-id"], "req-123");

        let (status, _) = app.call("GET", "/health/status", "").await;
        assert_eq!(status, StatusCode::OK);
    }
}

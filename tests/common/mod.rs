//! Common test utilities for Medlr
//!
//! Builds the real router on in-memory backends so tests can inspect and
//! break the store and cache directly.

#![allow(dead_code)]

use std::sync::Arc;

use axum::http::{header, HeaderName, HeaderValue};
use axum_test::TestServer;
use serde_json::{json, Value};

use medlr::{routes, AppState, CacheStore, Config, DocumentStore, InMemoryCache, InMemoryStore};

/// Test configuration constants
pub mod constants {
    /// Signing secret shared by the app under test and forged tokens
    pub const TEST_JWT_SECRET: &str = "test-signing-secret";
    /// Pharmacy identity used for protected calls
    pub const TEST_PHARMACY_ID: &str = "pharmacy-42";
}

/// A running app plus handles to its backends
pub struct TestApp {
    pub server: TestServer,
    pub state: Arc<AppState>,
    pub store: Arc<InMemoryStore>,
    pub cache: Arc<InMemoryCache>,
}

impl TestApp {
    /// App with caching enabled
    pub fn new() -> Self {
        Self::build(true)
    }

    /// App with no cache configured
    pub fn without_cache() -> Self {
        Self::build(false)
    }

    fn build(with_cache: bool) -> Self {
        let store = Arc::new(InMemoryStore::new());
        let cache = Arc::new(InMemoryCache::new());

        let cache_handle: Option<Arc<dyn CacheStore>> = if with_cache {
            Some(cache.clone() as Arc<dyn CacheStore>)
        } else {
            None
        };

        let state = Arc::new(
            AppState::from_parts(
                Config::for_testing(constants::TEST_JWT_SECRET),
                store.clone() as Arc<dyn DocumentStore>,
                cache_handle,
            )
            .expect("Failed to build app state"),
        );

        let server = TestServer::new(routes::create_router(state.clone()))
            .expect("Failed to create test server");

        Self {
            server,
            state,
            store,
            cache,
        }
    }

    /// A valid credential for `subject`
    pub fn token_for(&self, subject: &str) -> String {
        self.state
            .tokens
            .issue(subject)
            .expect("Failed to issue token")
            .token
    }

    /// A valid credential for the default test pharmacy
    pub fn token(&self) -> String {
        self.token_for(constants::TEST_PHARMACY_ID)
    }

    /// Create a pharmacy through the API and return its body
    pub async fn create_pharmacy(&self, body: Value) -> Value {
        let (name, value) = bearer(&self.token());
        let response = self
            .server
            .post("/api/v1/pharmacies")
            .add_header(name, value)
            .json(&body)
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()
    }

    /// Create a medicine owned by `pharmacy_id` and return its body
    pub async fn create_medicine(&self, pharmacy_id: &str, name: &str) -> Value {
        let (header_name, value) = bearer(&self.token_for(pharmacy_id));
        let response = self
            .server
            .post("/api/v1/medicine")
            .add_header(header_name, value)
            .json(&json!({
                "name": name,
                "description": "Pain relief",
                "price": "12.50",
                "stock": "100"
            }))
            .await;
        response.assert_status(axum::http::StatusCode::CREATED);
        response.json::<Value>()
    }
}

/// Authorization header carrying `token` as a bearer credential
pub fn bearer(token: &str) -> (HeaderName, HeaderValue) {
    (
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", token)).expect("Invalid header value"),
    )
}

/// A correctly signed credential whose expiry is already in the past
pub fn expired_token(subject: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": subject,
        "iat": now - 7200,
        "exp": now - 3600,
    });

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(constants::TEST_JWT_SECRET.as_bytes()),
    )
    .expect("Failed to encode token")
}

/// A well-formed credential signed with someone else's secret
pub fn foreign_token(subject: &str) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": subject,
        "iat": now,
        "exp": now + 3600,
    });

    jsonwebtoken::encode(
        &jsonwebtoken::Header::default(),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(b"some-other-secret"),
    )
    .expect("Failed to encode token")
}

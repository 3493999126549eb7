#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use tempfile::TempDir;
use serde_json::{json, Value};
use tower::ServiceExt;
use video_store_api::{
    config::AppConfig,
    db,
    entities::{customer, rental, video},
    AppState,
};

/// Configuration suitable for tests: one pooled connection to a private
/// in-memory SQLite database.
pub fn test_config() -> AppConfig {
    let mut cfg = AppConfig::new(
        "sqlite::memory:".to_string(),
        "127.0.0.1".to_string(),
        18_080,
        "test".to_string(),
    );
    cfg.auto_migrate = true;
    cfg.cors_allow_any_origin = true;
    cfg.db_max_connections = 1;
    cfg.db_min_connections = 1;
    cfg
}

/// Fresh migrated database.
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let cfg = test_config();
    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .expect("failed to create test database");
    db::run_migrations(&pool)
        .await
        .expect("failed to run migrations in tests");
    Arc::new(pool)
}

/// Helper harness for spinning up the full router backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(adjust: impl FnOnce(&mut AppConfig)) -> Self {
        let mut cfg = test_config();
        adjust(&mut cfg);

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg).expect("app state");
        let router = video_store_api::app_router(state.clone());

        Self { router, state }
    }

    /// Router over a SQLite file in a fresh temporary directory, asking for a
    /// pool of `max_connections`. The directory must outlive the app.
    pub async fn with_file_database(max_connections: u32) -> (Self, TempDir) {
        let dir = TempDir::new().expect("temp dir");
        let url = format!(
            "sqlite://{}?mode=rwc",
            dir.path().join("video_store.db").display()
        );
        let app = Self::with_config(move |cfg| {
            cfg.database_url = url;
            cfg.db_max_connections = max_connections;
            cfg.db_min_connections = 1;
        })
        .await;
        (app, dir)
    }

    pub fn db(&self) -> &DatabaseConnection {
        &self.state.db
    }

    /// Send a request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and decodes the JSON response body.
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.json(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.json(Method::DELETE, uri, None).await
    }

    pub async fn create_customer(&self, name: &str) -> i32 {
        let (status, body) = self
            .post(
                "/customers",
                json!({"name": name, "postal_code": "98122", "phone": "(555) 010-1234"}),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create customer: {body}");
        body["id"].as_i64().expect("customer id") as i32
    }

    pub async fn create_video(&self, title: &str, total_inventory: i32) -> i32 {
        let (status, body) = self
            .post(
                "/videos",
                json!({
                    "title": title,
                    "release_date": "1979-01-18",
                    "total_inventory": total_inventory,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create video: {body}");
        body["id"].as_i64().expect("video id") as i32
    }

    pub async fn check_out(&self, customer_id: i32, video_id: i32) -> (StatusCode, Value) {
        self.post(
            "/rentals/check-out",
            json!({"customer_id": customer_id, "video_id": video_id}),
        )
        .await
    }

    pub async fn check_in(&self, customer_id: i32, video_id: i32) -> (StatusCode, Value) {
        self.post(
            "/rentals/check-in",
            json!({"customer_id": customer_id, "video_id": video_id}),
        )
        .await
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    }
}

/// Asserts that every stored counter agrees with the live rental rows.
pub async fn assert_ledger_consistent(db: &DatabaseConnection) {
    let rentals = rental::Entity::find().all(db).await.expect("rentals");
    let mut per_customer: HashMap<i32, i32> = HashMap::new();
    let mut per_video: HashMap<i32, i32> = HashMap::new();
    for held in &rentals {
        *per_customer.entry(held.customer_id).or_default() += 1;
        *per_video.entry(held.video_id).or_default() += 1;
    }

    for c in customer::Entity::find().all(db).await.expect("customers") {
        assert!(c.videos_checked_out_count >= 0, "negative count: {c:?}");
        assert_eq!(
            c.videos_checked_out_count,
            per_customer.get(&c.id).copied().unwrap_or(0),
            "customer counter drifted: {c:?}"
        );
    }

    for v in video::Entity::find().all(db).await.expect("videos") {
        assert!(
            (0..=v.total_inventory).contains(&v.available_inventory),
            "availability out of range: {v:?}"
        );
        assert_eq!(
            v.checked_out(),
            per_video.get(&v.id).copied().unwrap_or(0),
            "video counter drifted: {v:?}"
        );
    }
}

//! Video Store API Library
//!
//! Customers, videos and the rental ledger that keeps their counters honest.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod metrics;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{
    response::Json,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub metrics: Arc<metrics::RentalMetrics>,
}

impl AppState {
    /// Builds the ledger, metrics registry and services on top of `db`.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
    ) -> Result<Self, metrics::MetricsError> {
        let metrics = Arc::new(metrics::RentalMetrics::new()?);
        let ledger = Arc::new(services::RentalLedger::new(config.rental_period()));
        let services = handlers::AppServices::new(db.clone(), ledger, metrics.clone());

        Ok(Self {
            db,
            config,
            services,
            metrics,
        })
    }
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}

#[cfg(test)]
mod response_tests {
    use super::*;
    use chrono::DateTime;

    #[tokio::test]
    async fn success_response_includes_request_metadata() {
        let response =
            crate::tracing::scope_request_id(crate::tracing::RequestId::new("meta-123"), async {
                ApiResponse::success("ok")
            })
            .await;

        let meta = response.meta.expect("metadata expected");
        assert_eq!(meta.request_id.as_deref(), Some("meta-123"));
        DateTime::parse_from_rfc3339(&meta.timestamp).expect("timestamp should parse");
    }
}

/// Standard API result type for JSON responses
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, errors::ServiceError>;

/// Resource routes. Mounted both at the root and under `/api/v1`.
pub fn api_v1_routes() -> Router<AppState> {
    use handlers::{customers, rentals, videos};

    Router::new()
        .route("/status", get(api_status))
        // Customers
        .route(
            "/customers",
            get(customers::list_customers).post(customers::create_customer),
        )
        .route(
            "/customers/:id",
            get(customers::get_customer)
                .put(customers::update_customer)
                .delete(customers::delete_customer),
        )
        .route("/customers/:id/rentals", get(customers::customer_rentals))
        // Videos
        .route(
            "/videos",
            get(videos::list_videos).post(videos::create_video),
        )
        .route(
            "/videos/:id",
            get(videos::get_video)
                .put(videos::update_video)
                .delete(videos::delete_video),
        )
        .route("/videos/:id/rentals", get(videos::video_rentals))
        // Rentals
        .route("/rentals/check-out", post(rentals::check_out))
        .route("/rentals/check-in", post(rentals::check_in))
}

/// Full application router: resource routes, health, metrics, Swagger UI,
/// request logging, HTTP tracing and request ids. CORS is layered by the
/// binary since it depends on deployment configuration.
pub fn app_router(state: AppState) -> Router {
    let api = api_v1_routes();

    let metrics_routes = Router::new()
        .route("/metrics", get(metrics::metrics_handler))
        .with_state(state.metrics.clone());

    Router::new()
        .merge(api.clone())
        .nest("/api/v1", api)
        .with_state(state.clone())
        .nest("/health", health::health_routes(state.db.clone()))
        .merge(metrics_routes)
        .merge(openapi::swagger_ui())
        .layer(axum::middleware::from_fn(request_logging_middleware))
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}

async fn api_status(
    axum::extract::State(state): axum::extract::State<AppState>,
) -> ApiResult<Value> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "git": option_env!("GIT_HASH").unwrap_or("unknown"),
        "build_time": option_env!("BUILD_TIME").unwrap_or("unknown"),
        "service": "video-store-api",
        "environment": state.config.environment,
        "rental_period_days": state.config.rental_period_days,
        "timestamp": Utc::now().to_rfc3339(),
    });

    Ok(Json(ApiResponse::success(status_data)))
}

// Request logging middleware
async fn request_logging_middleware(
    request: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    ::tracing::debug!(method = %method, uri = %uri, "Incoming request");

    let response = next.run(request).await;

    ::tracing::info!(
        method = %method,
        uri = %uri,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Request completed"
    );

    response
}

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

fn current_request_id() -> Option<String> {
    crate::tracing::current_request_id().map(|rid| rid.as_str().to_string())
}

/// Error body returned by every failing endpoint
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "Not Found",
    "message": "Customer 42 was not found",
    "request_id": "req-abc123xyz",
    "timestamp": "2024-12-09T10:30:00.000Z"
}))]
pub struct ErrorResponse {
    /// HTTP status category (e.g., "Not Found", "Bad Request")
    #[schema(example = "Not Found")]
    pub error: String,
    /// Human-readable error description
    #[schema(example = "Customer 42 was not found")]
    pub message: String,
    /// Offending field for validation failures
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "postal_code")]
    pub details: Option<String>,
    /// Unique request identifier for support and debugging
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(example = "req-abc123xyz")]
    pub request_id: Option<String>,
    /// ISO 8601 timestamp when error occurred
    #[schema(example = "2024-12-09T10:30:00.000Z")]
    pub timestamp: String,
}

/// The two top-level records a request can address by id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecordKind {
    Customer,
    Video,
}

impl RecordKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKind::Customer => "customer",
            RecordKind::Video => "video",
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordKind::Customer => f.write_str("Customer"),
            RecordKind::Video => f.write_str("Video"),
        }
    }
}

#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        sea_orm::error::DbErr,
    ),

    #[error("{kind} {id} was not found")]
    NotFound { kind: RecordKind, id: i32 },

    /// A required body field is absent or a value is out of range.
    #[error("{message}")]
    ValidationError {
        message: String,
        field: Option<String>,
    },

    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Could not perform checkout")]
    InventoryExhausted { video_id: i32 },

    #[error("No outstanding rentals for customer # {customer_id} and video {video_id}")]
    NoOutstandingRental { customer_id: i32, video_id: i32 },

    #[error("Internal error: {0}")]
    InternalError(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        let field = err.field_errors().keys().min().map(|name| name.to_string());
        ServiceError::ValidationError {
            message: err.to_string(),
            field,
        }
    }
}

impl ServiceError {
    pub fn not_found(kind: RecordKind, id: i32) -> Self {
        ServiceError::NotFound { kind, id }
    }

    /// Error for a request body that lacks `field`.
    pub fn missing_field(field: &str) -> Self {
        ServiceError::ValidationError {
            message: format!("Request body must include {}.", field),
            field: Some(field.to_string()),
        }
    }

    pub fn invalid_id(kind: RecordKind, raw: impl fmt::Display) -> Self {
        ServiceError::InvalidInput(format!("Invalid {} id '{}'", kind.as_str(), raw))
    }

    /// Returns the HTTP status code for this error.
    /// This is the single source of truth for error-to-status mapping.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::ValidationError { .. }
            | Self::InvalidInput(_)
            | Self::InvalidOperation(_)
            | Self::BadRequest(_)
            | Self::InventoryExhausted { .. }
            | Self::NoOutstandingRental { .. } => StatusCode::BAD_REQUEST,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Returns the error message suitable for HTTP responses.
    /// Internal errors return generic messages to avoid leaking implementation details.
    pub fn response_message(&self) -> String {
        match self {
            Self::DatabaseError(_) => "Database error".to_string(),
            Self::InternalError(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }

    fn details(&self) -> Option<String> {
        match self {
            Self::ValidationError { field, .. } => field.clone(),
            _ => None,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let err = ErrorResponse {
            error: status.canonical_reason().unwrap_or("Error").to_string(),
            message: self.response_message(),
            details: self.details(),
            request_id: current_request_id(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        (status, Json(err)).into_response()
    }
}

use crate::errors::{RecordKind, ServiceError};
use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Standard created response
pub fn created_response<T: Serialize>(data: T) -> Response {
    (StatusCode::CREATED, Json(data)).into_response()
}

/// JSON body extractor whose rejections render as [`ServiceError::BadRequest`]
/// instead of axum's plain-text 4xx bodies.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(JsonBody(value)),
            Err(rejection) => Err(ServiceError::BadRequest(rejection.body_text())),
        }
    }
}

/// Body returned by the delete endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DeletedResponse {
    pub id: i32,
}

/// An id as it may appear in a JSON body: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum IdValue {
    Number(i64),
    Text(String),
}

impl fmt::Display for IdValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdValue::Number(n) => write!(f, "{}", n),
            IdValue::Text(s) => f.write_str(s),
        }
    }
}

impl IdValue {
    pub fn resolve(&self, kind: RecordKind) -> Result<i32, ServiceError> {
        match self {
            IdValue::Number(n) => i32::try_from(*n).map_err(|_| ServiceError::invalid_id(kind, n)),
            IdValue::Text(raw) => parse_id(kind, raw),
        }
    }
}

/// Parses a path or body id, rejecting anything that is not an integer.
pub fn parse_id(kind: RecordKind, raw: &str) -> Result<i32, ServiceError> {
    raw.trim()
        .parse::<i32>()
        .map_err(|_| ServiceError::invalid_id(kind, raw))
}

/// Unwraps a required body field or reports it missing by name.
pub fn require<T>(value: Option<T>, field: &str) -> Result<T, ServiceError> {
    value.ok_or_else(|| ServiceError::missing_field(field))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rstest::rstest;

    #[rstest]
    #[case("7", 7)]
    #[case(" 12 ", 12)]
    #[case("-3", -3)]
    fn parse_id_accepts_integers(#[case] raw: &str, #[case] expected: i32) {
        assert_eq!(parse_id(RecordKind::Customer, raw).unwrap(), expected);
    }

    #[rstest]
    #[case("abc")]
    #[case("1.5")]
    #[case("")]
    #[case("99999999999")]
    fn parse_id_rejects_non_integers(#[case] raw: &str) {
        let err = parse_id(RecordKind::Video, raw).unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(ref msg) if msg == &format!("Invalid video id '{}'", raw));
    }

    #[test]
    fn body_ids_accept_numbers_and_numeric_strings() {
        let number: IdValue = serde_json::from_str("4").unwrap();
        let text: IdValue = serde_json::from_str("\"4\"").unwrap();
        assert_eq!(number.resolve(RecordKind::Customer).unwrap(), 4);
        assert_eq!(text.resolve(RecordKind::Customer).unwrap(), 4);

        let bad: IdValue = serde_json::from_str("\"four\"").unwrap();
        assert_matches!(
            bad.resolve(RecordKind::Customer),
            Err(ServiceError::InvalidInput(_))
        );
    }

    #[test]
    fn require_names_the_missing_field() {
        let err = require::<String>(None, "phone").unwrap_err();
        assert_matches!(
            err,
            ServiceError::ValidationError { field: Some(ref f), .. } if f == "phone"
        );
        assert_eq!(require(Some(3), "total_inventory").unwrap(), 3);
    }
}

use super::common::{require, IdValue, JsonBody};
use crate::{
    errors::{ErrorResponse, RecordKind, ServiceError},
    services::RentalReceipt,
    AppState,
};
use axum::{extract::State, Json};
use serde::Deserialize;
use utoipa::ToSchema;

/// Identifies the customer and video of a checkout or check-in.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct RentalRequest {
    #[schema(value_type = Option<i32>, example = 1)]
    pub customer_id: Option<IdValue>,
    #[schema(value_type = Option<i32>, example = 1)]
    pub video_id: Option<IdValue>,
}

impl RentalRequest {
    /// Resolves `(customer_id, video_id)`. Presence is checked first for both
    /// fields, then the video id is parsed before the customer id.
    fn resolve(self) -> Result<(i32, i32), ServiceError> {
        let customer_id = require(self.customer_id, "customer_id")?;
        let video_id = require(self.video_id, "video_id")?;

        let video_id = video_id.resolve(RecordKind::Video)?;
        let customer_id = customer_id.resolve(RecordKind::Customer)?;
        Ok((customer_id, video_id))
    }
}

#[utoipa::path(
    post,
    path = "/rentals/check-out",
    tag = "Rentals",
    request_body = RentalRequest,
    responses(
        (status = 200, description = "Copy lent; receipt carries the due date", body = RentalReceipt),
        (status = 400, description = "Missing field, bad id, or no copies available", body = ErrorResponse),
        (status = 404, description = "Customer or video not found", body = ErrorResponse)
    )
)]
pub async fn check_out(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RentalRequest>,
) -> Result<Json<RentalReceipt>, ServiceError> {
    let (customer_id, video_id) = body.resolve()?;
    let receipt = state
        .services
        .rentals
        .check_out(customer_id, video_id)
        .await?;
    Ok(Json(receipt))
}

#[utoipa::path(
    post,
    path = "/rentals/check-in",
    tag = "Rentals",
    request_body = RentalRequest,
    responses(
        (status = 200, description = "Copy returned", body = RentalReceipt),
        (status = 400, description = "Missing field, bad id, or nothing to return", body = ErrorResponse),
        (status = 404, description = "Customer or video not found", body = ErrorResponse)
    )
)]
pub async fn check_in(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<RentalRequest>,
) -> Result<Json<RentalReceipt>, ServiceError> {
    let (customer_id, video_id) = body.resolve()?;
    let receipt = state
        .services
        .rentals
        .check_in(customer_id, video_id)
        .await?;
    Ok(Json(receipt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn request(body: serde_json::Value) -> RentalRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn resolves_numeric_and_string_ids() {
        let ids = request(serde_json::json!({"customer_id": "3", "video_id": 8}))
            .resolve()
            .unwrap();
        assert_eq!(ids, (3, 8));
    }

    #[test]
    fn customer_id_presence_is_checked_first() {
        assert_matches!(
            request(serde_json::json!({})).resolve(),
            Err(ServiceError::ValidationError { field: Some(ref f), .. }) if f == "customer_id"
        );
        assert_matches!(
            request(serde_json::json!({"customer_id": 1})).resolve(),
            Err(ServiceError::ValidationError { field: Some(ref f), .. }) if f == "video_id"
        );
    }

    #[test]
    fn video_id_is_parsed_before_customer_id() {
        let err = request(serde_json::json!({"customer_id": "x", "video_id": "y"}))
            .resolve()
            .unwrap_err();
        assert_matches!(err, ServiceError::InvalidInput(ref msg) if msg == "Invalid video id 'y'");
    }
}

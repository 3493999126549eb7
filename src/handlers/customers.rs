use super::common::{created_response, parse_id, require, DeletedResponse, JsonBody};
use crate::{
    entities::customer,
    errors::{ErrorResponse, RecordKind, ServiceError},
    services::{CustomerInput, RentedVideo},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;

/// Customer fields accepted on create and update. All three are required.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CustomerRequest {
    #[schema(example = "Ada Lovelace")]
    pub name: Option<String>,
    #[schema(example = "98122")]
    pub postal_code: Option<String>,
    #[schema(example = "(555) 010-1234")]
    pub phone: Option<String>,
}

impl CustomerRequest {
    fn into_input(self) -> Result<CustomerInput, ServiceError> {
        Ok(CustomerInput {
            name: require(self.name, "name")?,
            postal_code: require(self.postal_code, "postal_code")?,
            phone: require(self.phone, "phone")?,
        })
    }
}

#[utoipa::path(
    get,
    path = "/customers",
    tag = "Customers",
    responses((status = 200, description = "All customers ordered by id", body = [customer::Model]))
)]
pub async fn list_customers(
    State(state): State<AppState>,
) -> Result<Json<Vec<customer::Model>>, ServiceError> {
    let customers = state.services.customers.list_customers().await?;
    Ok(Json(customers))
}

#[utoipa::path(
    post,
    path = "/customers",
    tag = "Customers",
    request_body = CustomerRequest,
    responses(
        (status = 201, description = "Customer registered", body = customer::Model),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse)
    )
)]
pub async fn create_customer(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<CustomerRequest>,
) -> Result<Response, ServiceError> {
    let created = state
        .services
        .customers
        .create_customer(body.into_input()?)
        .await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/customers/{id}",
    tag = "Customers",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer found", body = customer::Model),
        (status = 400, description = "Id is not an integer", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
pub async fn get_customer(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<customer::Model>, ServiceError> {
    let id = parse_id(RecordKind::Customer, &raw_id)?;
    Ok(Json(state.services.customers.get_customer(id).await?))
}

#[utoipa::path(
    put,
    path = "/customers/{id}",
    tag = "Customers",
    params(("id" = i32, Path, description = "Customer id")),
    request_body = CustomerRequest,
    responses(
        (status = 200, description = "Customer updated", body = customer::Model),
        (status = 400, description = "Missing field or bad id", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
pub async fn update_customer(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(body): JsonBody<CustomerRequest>,
) -> Result<Json<customer::Model>, ServiceError> {
    let id = parse_id(RecordKind::Customer, &raw_id)?;
    // existence is reported before body problems
    let existing = state.services.customers.get_customer(id).await?;
    let updated = state
        .services
        .customers
        .update_customer(existing, body.into_input()?)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/customers/{id}",
    tag = "Customers",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Customer deleted; held copies returned to stock", body = DeletedResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
pub async fn delete_customer(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DeletedResponse>, ServiceError> {
    let id = parse_id(RecordKind::Customer, &raw_id)?;
    let id = state.services.customers.delete_customer(id).await?;
    Ok(Json(DeletedResponse { id }))
}

#[utoipa::path(
    get,
    path = "/customers/{id}/rentals",
    tag = "Customers",
    params(("id" = i32, Path, description = "Customer id")),
    responses(
        (status = 200, description = "Videos the customer currently holds", body = [RentedVideo]),
        (status = 404, description = "Customer not found", body = ErrorResponse)
    )
)]
pub async fn customer_rentals(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<RentedVideo>>, ServiceError> {
    let id = parse_id(RecordKind::Customer, &raw_id)?;
    Ok(Json(state.services.customers.rented_videos(id).await?))
}

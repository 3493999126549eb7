use super::common::{created_response, parse_id, require, DeletedResponse, JsonBody};
use crate::{
    entities::video,
    errors::{ErrorResponse, RecordKind, ServiceError},
    services::{VideoInput, VideoRenter},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::Response,
    Json,
};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::ToSchema;

/// Video fields accepted on create and update. All three are required.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct VideoRequest {
    #[schema(example = "Blacksmith Of The Banished")]
    pub title: Option<String>,
    #[schema(value_type = Option<String>, format = Date, example = "1979-01-18")]
    pub release_date: Option<NaiveDate>,
    #[schema(example = 3)]
    pub total_inventory: Option<i32>,
}

impl VideoRequest {
    fn into_input(self) -> Result<VideoInput, ServiceError> {
        Ok(VideoInput {
            title: require(self.title, "title")?,
            release_date: require(self.release_date, "release_date")?,
            total_inventory: require(self.total_inventory, "total_inventory")?,
        })
    }
}

#[utoipa::path(
    get,
    path = "/videos",
    tag = "Videos",
    responses((status = 200, description = "All videos ordered by id", body = [video::Model]))
)]
pub async fn list_videos(
    State(state): State<AppState>,
) -> Result<Json<Vec<video::Model>>, ServiceError> {
    Ok(Json(state.services.videos.list_videos().await?))
}

#[utoipa::path(
    post,
    path = "/videos",
    tag = "Videos",
    request_body = VideoRequest,
    responses(
        (status = 201, description = "Video added with every copy available", body = video::Model),
        (status = 400, description = "Missing or invalid field", body = ErrorResponse)
    )
)]
pub async fn create_video(
    State(state): State<AppState>,
    JsonBody(body): JsonBody<VideoRequest>,
) -> Result<Response, ServiceError> {
    let created = state
        .services
        .videos
        .create_video(body.into_input()?)
        .await?;
    Ok(created_response(created))
}

#[utoipa::path(
    get,
    path = "/videos/{id}",
    tag = "Videos",
    params(("id" = i32, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video found", body = video::Model),
        (status = 400, description = "Id is not an integer", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn get_video(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<video::Model>, ServiceError> {
    let id = parse_id(RecordKind::Video, &raw_id)?;
    Ok(Json(state.services.videos.get_video(id).await?))
}

#[utoipa::path(
    put,
    path = "/videos/{id}",
    tag = "Videos",
    params(("id" = i32, Path, description = "Video id")),
    request_body = VideoRequest,
    responses(
        (status = 200, description = "Video updated", body = video::Model),
        (status = 400, description = "Missing field, bad id, or total below copies on loan", body = ErrorResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn update_video(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    JsonBody(body): JsonBody<VideoRequest>,
) -> Result<Json<video::Model>, ServiceError> {
    let id = parse_id(RecordKind::Video, &raw_id)?;
    state.services.videos.get_video(id).await?;
    let updated = state
        .services
        .videos
        .update_video(id, body.into_input()?)
        .await?;
    Ok(Json(updated))
}

#[utoipa::path(
    delete,
    path = "/videos/{id}",
    tag = "Videos",
    params(("id" = i32, Path, description = "Video id")),
    responses(
        (status = 200, description = "Video deleted; its rentals closed", body = DeletedResponse),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn delete_video(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<DeletedResponse>, ServiceError> {
    let id = parse_id(RecordKind::Video, &raw_id)?;
    let id = state.services.videos.delete_video(id).await?;
    Ok(Json(DeletedResponse { id }))
}

#[utoipa::path(
    get,
    path = "/videos/{id}/rentals",
    tag = "Videos",
    params(("id" = i32, Path, description = "Video id")),
    responses(
        (status = 200, description = "Customers currently holding the video", body = [VideoRenter]),
        (status = 404, description = "Video not found", body = ErrorResponse)
    )
)]
pub async fn video_rentals(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> Result<Json<Vec<VideoRenter>>, ServiceError> {
    let id = parse_id(RecordKind::Video, &raw_id)?;
    Ok(Json(state.services.videos.renters(id).await?))
}

use super::dto::{PublishRequest, PublishResponse};
use super::service::PublishService;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

/// Upload the current artifact to YouTube as a private video
#[utoipa::path(
    post,
    path = "/api/v1/clips/{id}/publish",
    params(("id" = i64, Path, description = "Clip job ID")),
    request_body = PublishRequest,
    responses(
        (status = 200, description = "Video uploaded", body = ApiResponse<PublishResponse>),
        (status = 401, description = "No usable publishing credential"),
        (status = 404, description = "Clip job not found"),
        (status = 409, description = "Clip not exported or metadata missing"),
        (status = 502, description = "YouTube rejected the upload")
    ),
    tag = "Publish"
)]
pub async fn publish_clip(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<PublishRequest>,
) -> impl IntoResponse {
    match PublishService::publish(state, id, req).await {
        Ok(res) => ApiSuccess::ok(res, "Video uploaded successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

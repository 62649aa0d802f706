use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::modules::clip::dto::*;
use crate::modules::clip::model::ClipJob;
use crate::modules::clip::service::ClipService;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

/// Create a clip job
#[utoipa::path(
    post,
    path = "/api/v1/clips",
    request_body = CreateClipRequest,
    responses(
        (status = 201, description = "Clip job created", body = ApiResponse<ClipCreatedResponse>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 500, description = "Ledger write failed")
    ),
    tag = "Clips"
)]
pub async fn create_clip(
    State(state): State<AppState>,
    Json(req): Json<CreateClipRequest>,
) -> impl IntoResponse {
    match ClipService::create(state, req).await {
        Ok(job) => ApiSuccess::created(ClipCreatedResponse { id: job.id }, "Clip request received").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// List all clip jobs
#[utoipa::path(
    get,
    path = "/api/v1/clips",
    responses(
        (status = 200, description = "All clip jobs in creation order", body = ApiResponse<Vec<ClipJob>>)
    ),
    tag = "Clips"
)]
pub async fn list_clips(State(state): State<AppState>) -> impl IntoResponse {
    let jobs = ClipService::list(state).await;
    ApiSuccess::ok(jobs, "Clip jobs retrieved successfully").into_response()
}

/// Get a clip job by ID
#[utoipa::path(
    get,
    path = "/api/v1/clips/{id}",
    params(("id" = i64, Path, description = "Clip job ID")),
    responses(
        (status = 200, description = "Clip job", body = ApiResponse<ClipJob>),
        (status = 404, description = "Clip job not found")
    ),
    tag = "Clips"
)]
pub async fn get_clip(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match ClipService::get(state, id).await {
        Ok(job) => ApiSuccess::ok(job, "Clip job retrieved successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Delete a clip job
#[utoipa::path(
    delete,
    path = "/api/v1/clips/{id}",
    params(("id" = i64, Path, description = "Clip job ID")),
    responses(
        (status = 200, description = "Clip job deleted", body = ApiResponse<String>),
        (status = 404, description = "Clip job not found")
    ),
    tag = "Clips"
)]
pub async fn delete_clip(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match ClipService::delete(state, id).await {
        Ok(()) => ApiSuccess::ok((), "Clip request deleted successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Trim and merge the source streams into a clip
#[utoipa::path(
    post,
    path = "/api/v1/clips/{id}/export",
    params(("id" = i64, Path, description = "Clip job ID")),
    responses(
        (status = 200, description = "Clip exported", body = ApiResponse<StageResponse>),
        (status = 404, description = "Clip job not found"),
        (status = 500, description = "ffmpeg failed"),
        (status = 502, description = "Stream resolution failed")
    ),
    tag = "Clips"
)]
pub async fn export_clip(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    match ClipService::export(state, id).await {
        Ok(res) => ApiSuccess::ok(res, "Clip exported successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Burn subtitles into the current artifact
#[utoipa::path(
    post,
    path = "/api/v1/clips/{id}/subtitles",
    params(("id" = i64, Path, description = "Clip job ID")),
    request_body = BurnSubtitlesRequest,
    responses(
        (status = 200, description = "Subtitles burned in", body = ApiResponse<StageResponse>),
        (status = 400, description = "Invalid colors, font size or transcript"),
        (status = 409, description = "Clip not exported yet"),
        (status = 500, description = "ffmpeg failed")
    ),
    tag = "Clips"
)]
pub async fn burn_subtitles(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<BurnSubtitlesRequest>,
) -> impl IntoResponse {
    match ClipService::burn_subtitles(state, id, req).await {
        Ok(res) => ApiSuccess::ok(res, "Subtitles added successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Crop or pad the current artifact to a ratio
#[utoipa::path(
    post,
    path = "/api/v1/clips/{id}/crop",
    params(("id" = i64, Path, description = "Clip job ID")),
    request_body = CropRequest,
    responses(
        (status = 200, description = "Clip cropped", body = ApiResponse<StageResponse>),
        (status = 400, description = "Unknown ratio"),
        (status = 409, description = "Clip not exported yet"),
        (status = 500, description = "ffmpeg failed")
    ),
    tag = "Clips"
)]
pub async fn crop_clip(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<CropRequest>,
) -> impl IntoResponse {
    match ClipService::crop(state, id, req).await {
        Ok(res) => ApiSuccess::ok(res, "Video cropped successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Draw a text caption over the current artifact
#[utoipa::path(
    post,
    path = "/api/v1/clips/{id}/overlay",
    params(("id" = i64, Path, description = "Clip job ID")),
    request_body = OverlayTextRequest,
    responses(
        (status = 200, description = "Text drawn over the clip", body = ApiResponse<StageResponse>),
        (status = 400, description = "Invalid text, colors or font size"),
        (status = 409, description = "Clip not exported yet"),
        (status = 500, description = "ffmpeg failed")
    ),
    tag = "Clips"
)]
pub async fn overlay_text(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<OverlayTextRequest>,
) -> impl IntoResponse {
    match ClipService::overlay_text(state, id, req).await {
        Ok(res) => ApiSuccess::ok(res, "Text added successfully").into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

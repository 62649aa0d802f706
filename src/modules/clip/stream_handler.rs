use axum::{
    body::Body,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use tokio_util::io::ReaderStream;

use crate::common::response::ApiError;
use crate::modules::clip::service::ClipService;
use crate::state::AppState;

/// Stream the job's current artifact as an attachment
#[utoipa::path(
    get,
    path = "/api/v1/clips/{id}/download",
    params(("id" = i64, Path, description = "Clip job ID")),
    responses(
        (status = 200, description = "Artifact bytes", content_type = "video/mp4"),
        (status = 404, description = "Clip job or artifact not found")
    ),
    tag = "Clips"
)]
pub async fn download_clip(State(state): State<AppState>, Path(id): Path<i64>) -> impl IntoResponse {
    let (path, name) = match ClipService::artifact_file(state, id).await {
        Ok(found) => found,
        Err(e) => return ApiError::from(e).into_response(),
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(f) => f,
        Err(e) => {
            tracing::error!("Failed to open {}: {}", path.display(), e);
            return ApiError("Failed to open clip file".to_string(), StatusCode::INTERNAL_SERVER_ERROR)
                .into_response();
        }
    };
    let length = file.metadata().await.ok().map(|m| m.len());

    let content_type = mime_guess::from_path(&path).first_or(mime::APPLICATION_OCTET_STREAM);
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.essence_str())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", name.replace('"', "")),
        );
    if let Some(len) = length {
        builder = builder.header(header::CONTENT_LENGTH, len.to_string());
    }

    match builder.body(Body::from_stream(ReaderStream::new(file))) {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Failed to build download response: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

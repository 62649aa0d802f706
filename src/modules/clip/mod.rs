use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod locks;
pub mod model;
pub mod repository;
pub mod service;
pub mod stream_handler;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/clips", post(handler::create_clip).get(handler::list_clips))
        .route("/clips/{id}", get(handler::get_clip).delete(handler::delete_clip))
        .route("/clips/{id}/export", post(handler::export_clip))
        .route("/clips/{id}/subtitles", post(handler::burn_subtitles))
        .route("/clips/{id}/crop", post(handler::crop_clip))
        .route("/clips/{id}/overlay", post(handler::overlay_text))
        .route("/clips/{id}/download", get(stream_handler::download_clip))
}

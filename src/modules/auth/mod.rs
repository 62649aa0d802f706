use axum::Router;
use axum::routing::get;
use crate::state::AppState;

pub mod dto;
pub mod handler;
pub mod model;
pub mod service;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/google", get(handler::google_login))
        .route("/google/callback", get(handler::google_callback))
        .route("/status", get(handler::credential_status))
}

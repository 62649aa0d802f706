use super::dto::{CredentialStatusResponse, OAuthCallbackQuery};
use super::model::CredentialState;
use crate::common::response::{ApiError, ApiResponse, ApiSuccess};
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
};
use tower_cookies::{Cookie, Cookies};
use uuid::Uuid;

const STATE_COOKIE: &str = "oauth_state";

/// Redirect to the Google consent screen
#[utoipa::path(
    get,
    path = "/api/v1/auth/google",
    responses(
        (status = 303, description = "Redirect to the consent screen"),
        (status = 409, description = "OAuth client not configured")
    ),
    tag = "Auth"
)]
pub async fn google_login(State(state): State<AppState>, cookies: Cookies) -> impl IntoResponse {
    let csrf = Uuid::new_v4().simple().to_string();
    match state.credentials.authorization_url(&csrf) {
        Ok(url) => {
            let mut cookie = Cookie::new(STATE_COOKIE, csrf);
            cookie.set_http_only(true);
            cookie.set_path("/api/v1/auth");
            cookie.set_max_age(Some(time::Duration::minutes(10)));
            cookies.add(cookie);

            Redirect::to(&url).into_response()
        }
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Finish the authorization-code grant and store the credential
#[utoipa::path(
    get,
    path = "/api/v1/auth/google/callback",
    params(OAuthCallbackQuery),
    responses(
        (status = 200, description = "Credential stored", body = ApiResponse<CredentialStatusResponse>),
        (status = 400, description = "Missing code or state mismatch"),
        (status = 502, description = "Token exchange failed")
    ),
    tag = "Auth"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    cookies: Cookies,
    Query(query): Query<OAuthCallbackQuery>,
) -> impl IntoResponse {
    let expected = cookies.get(STATE_COOKIE).map(|c| c.value().to_string());
    let mut cookie = Cookie::new(STATE_COOKIE, "");
    cookie.set_path("/api/v1/auth");
    cookies.remove(cookie);

    if let Some(err) = query.error {
        return ApiError(format!("Authorization denied: {}", err), StatusCode::BAD_REQUEST).into_response();
    }
    let Some(code) = query.code else {
        return ApiError("Missing authorization code".to_string(), StatusCode::BAD_REQUEST).into_response();
    };
    if expected.is_none() || expected != query.state {
        return ApiError("OAuth state mismatch".to_string(), StatusCode::BAD_REQUEST).into_response();
    }

    match state.credentials.complete_authorization(&code).await {
        Ok(credential_state) => ApiSuccess::ok(
            CredentialStatusResponse { state: credential_state },
            "Authorization successful! You can close this tab.",
        )
        .into_response(),
        Err(e) => ApiError::from(e).into_response(),
    }
}

/// Report whether a publishing credential is available
#[utoipa::path(
    get,
    path = "/api/v1/auth/status",
    responses(
        (status = 200, description = "Credential state", body = ApiResponse<CredentialStatusResponse>)
    ),
    tag = "Auth"
)]
pub async fn credential_status(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.credentials.state().await;
    let message = match current {
        CredentialState::Valid => "Credential is valid",
        CredentialState::Expired => "Credential expired; it will be refreshed on next publish",
        CredentialState::Unauthorized => "No credential; authorize via /api/v1/auth/google",
    };
    ApiSuccess::ok(CredentialStatusResponse { state: current }, message).into_response()
}

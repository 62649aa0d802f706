//! Google OAuth 2.0 authorization-code and refresh-token grants.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::common::error::{ClipError, ClipResult};
use crate::config::settings::GoogleOAuthConfig;

pub const UPLOAD_SCOPE: &str = "https://www.googleapis.com/auth/youtube.upload";

/// Token endpoint response. `refresh_token` is only present on the first
/// consent or when `prompt=consent` forces a new one.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct TokenGrant {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenErrorBody {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

#[async_trait]
pub trait OAuthClient: Send + Sync {
    fn authorization_url(&self, state: &str) -> ClipResult<String>;
    async fn exchange_code(&self, code: &str) -> ClipResult<TokenGrant>;
    async fn refresh(&self, refresh_token: &str) -> ClipResult<TokenGrant>;
}

pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: GoogleOAuthConfig,
}

impl GoogleOAuthClient {
    pub fn new(http: reqwest::Client, config: GoogleOAuthConfig) -> Self {
        Self { http, config }
    }

    async fn token_request(&self, grant: &[(&str, &str)]) -> ClipResult<TokenGrant> {
        let mut form = vec![
            ("client_id", self.config.client_id.as_str()),
            ("client_secret", self.config.client_secret.as_str()),
        ];
        form.extend_from_slice(grant);

        let response = self
            .http
            .post(&self.config.token_url)
            .form(&form)
            .send()
            .await
            .map_err(|e| ClipError::Remote(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClipError::Remote(format!("failed to read token response: {}", e)))?;

        if !status.is_success() {
            return Err(token_error(status, &body));
        }

        serde_json::from_str(&body)
            .map_err(|e| ClipError::Remote(format!("malformed token response: {}", e)))
    }
}

#[async_trait]
impl OAuthClient for GoogleOAuthClient {
    fn authorization_url(&self, state: &str) -> ClipResult<String> {
        let url = Url::parse_with_params(
            &self.config.auth_url,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", UPLOAD_SCOPE),
                ("access_type", "offline"),
                ("prompt", "consent"),
                ("state", state),
            ],
        )
        .map_err(|e| ClipError::validation(format!("invalid GOOGLE_AUTH_URL: {}", e)))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> ClipResult<TokenGrant> {
        debug!("Exchanging authorization code");
        self.token_request(&[
            ("grant_type", "authorization_code"),
            ("code", code),
            ("redirect_uri", self.config.redirect_uri.as_str()),
        ])
        .await
    }

    async fn refresh(&self, refresh_token: &str) -> ClipResult<TokenGrant> {
        debug!("Refreshing access token");
        self.token_request(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token),
        ])
        .await
    }
}

/// A revoked or expired grant means the operator has to authorize again.
fn token_error(status: StatusCode, body: &str) -> ClipError {
    let parsed: Option<TokenErrorBody> = serde_json::from_str(body).ok();
    let detail = parsed
        .as_ref()
        .map(|b| match &b.error_description {
            Some(desc) => format!("{}: {}", b.error, desc),
            None => b.error.clone(),
        })
        .unwrap_or_else(|| body.chars().take(200).collect());

    let revoked = matches!(status, StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED)
        && parsed
            .as_ref()
            .is_some_and(|b| matches!(b.error.as_str(), "invalid_grant" | "unauthorized_client"));

    warn!("Token endpoint returned {}: {}", status, detail);
    if revoked {
        ClipError::Unauthorized(format!("grant rejected ({})", detail))
    } else {
        ClipError::Remote(format!("token endpoint returned {}: {}", status, detail))
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::infrastructure::google::TokenGrant;

/// Tokens are treated as expired this long before Google says they are.
pub const REFRESH_MARGIN_MS: i64 = 60_000;

/// Token document in the layout Google's client libraries write
/// (`expiry_date` is epoch milliseconds), so an existing tokens file keeps working.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<i64>,
}

impl StoredCredential {
    /// Google omits the refresh token on refresh responses; keep the one we already have.
    pub fn from_grant(grant: TokenGrant, previous_refresh: Option<String>, now_ms: i64) -> Self {
        Self {
            access_token: grant.access_token,
            refresh_token: grant.refresh_token.or(previous_refresh),
            scope: grant.scope,
            token_type: grant.token_type,
            expiry_date: grant.expires_in.map(|secs| now_ms + secs * 1000),
        }
    }

    pub fn state_at(&self, now_ms: i64) -> CredentialState {
        match self.expiry_date {
            Some(expiry) if now_ms + REFRESH_MARGIN_MS >= expiry => CredentialState::Expired,
            _ => CredentialState::Valid,
        }
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CredentialState {
    Unauthorized,
    Valid,
    Expired,
}

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::model::CredentialState;

#[derive(Debug, Deserialize, IntoParams)]
pub struct OAuthCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    /// Set by Google when the user denies consent.
    pub error: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CredentialStatusResponse {
    pub state: CredentialState,
}

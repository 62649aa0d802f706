use std::path::PathBuf;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::{info, warn};

use super::model::{CredentialState, StoredCredential};
use crate::common::error::{ClipError, ClipResult};
use crate::common::fs::write_atomic;
use crate::infrastructure::google::OAuthClient;

#[derive(Default)]
struct Slot {
    loaded: bool,
    credential: Option<StoredCredential>,
}

/// Process-wide publishing credential. Loaded from disk on first use,
/// refreshed transparently before it is handed out.
pub struct CredentialManager {
    path: PathBuf,
    client: Option<Arc<dyn OAuthClient>>,
    slot: Mutex<Slot>,
}

fn now_ms() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

impl CredentialManager {
    pub fn new(path: impl Into<PathBuf>, client: Option<Arc<dyn OAuthClient>>) -> Self {
        Self {
            path: path.into(),
            client,
            slot: Mutex::new(Slot::default()),
        }
    }

    fn client(&self) -> ClipResult<&Arc<dyn OAuthClient>> {
        self.client.as_ref().ok_or_else(|| {
            ClipError::precondition(
                "Google OAuth client is not configured (set GOOGLE_CLIENT_ID/SECRET/REDIRECT_URI or GOOGLE_CLIENT_SECRET_FILE)",
            )
        })
    }

    async fn load(&self, slot: &mut Slot) {
        if slot.loaded {
            return;
        }
        slot.loaded = true;
        slot.credential = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => match serde_json::from_str(&raw) {
                Ok(cred) => Some(cred),
                Err(e) => {
                    warn!("Ignoring unreadable token file {}: {}", self.path.display(), e);
                    None
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!("Failed to read token file {}: {}", self.path.display(), e);
                None
            }
        };
    }

    async fn store(&self, slot: &mut Slot, credential: StoredCredential) -> ClipResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let body = serde_json::to_vec_pretty(&credential)
            .map_err(|e| ClipError::Persistence(format!("failed to encode credential: {}", e)))?;
        write_atomic(&self.path, &body).await.map_err(|e| {
            ClipError::Persistence(format!("failed to write {}: {}", self.path.display(), e))
        })?;
        slot.credential = Some(credential);
        Ok(())
    }

    async fn clear(&self, slot: &mut Slot) {
        slot.credential = None;
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("Failed to remove token file {}: {}", self.path.display(), e);
            }
        }
    }

    pub async fn state(&self) -> CredentialState {
        let mut slot = self.slot.lock().await;
        self.load(&mut slot).await;
        match &slot.credential {
            None => CredentialState::Unauthorized,
            Some(cred) => cred.state_at(now_ms()),
        }
    }

    /// A usable access token, refreshing first when the stored one is expired.
    pub async fn access_token(&self) -> ClipResult<String> {
        let mut slot = self.slot.lock().await;
        self.load(&mut slot).await;

        let Some(current) = slot.credential.clone() else {
            return Err(ClipError::Unauthorized(
                "no publishing credential; authorize via /api/v1/auth/google".into(),
            ));
        };
        if current.state_at(now_ms()) == CredentialState::Valid {
            return Ok(current.access_token);
        }

        let Some(refresh_token) = current.refresh_token.clone() else {
            return Err(ClipError::Unauthorized(
                "credential expired and has no refresh token; authorize again".into(),
            ));
        };
        let client = self
            .client()
            .map_err(|e| ClipError::Unauthorized(e.to_string()))?
            .clone();

        match client.refresh(&refresh_token).await {
            Ok(grant) => {
                let refreshed = StoredCredential::from_grant(grant, Some(refresh_token), now_ms());
                let token = refreshed.access_token.clone();
                self.store(&mut slot, refreshed).await?;
                info!("🔑 Publishing credential refreshed");
                Ok(token)
            }
            Err(ClipError::Unauthorized(msg)) => {
                warn!("Refresh rejected, clearing stored credential: {}", msg);
                self.clear(&mut slot).await;
                Err(ClipError::Unauthorized(msg))
            }
            Err(e) => Err(e),
        }
    }

    /// Force a refresh on next use, e.g. after the API rejected the token.
    pub async fn mark_expired(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(cred) = slot.credential.as_mut() {
            cred.expiry_date = Some(0);
        }
    }

    pub fn authorization_url(&self, state: &str) -> ClipResult<String> {
        self.client()?.authorization_url(state)
    }

    pub async fn complete_authorization(&self, code: &str) -> ClipResult<CredentialState> {
        let client = self.client()?.clone();
        let grant = client.exchange_code(code).await?;

        let mut slot = self.slot.lock().await;
        self.load(&mut slot).await;
        let previous = slot.credential.as_ref().and_then(|c| c.refresh_token.clone());
        let credential = StoredCredential::from_grant(grant, previous, now_ms());
        let state = credential.state_at(now_ms());
        self.store(&mut slot, credential).await?;

        info!("🔑 Publishing credential stored at {}", self.path.display());
        Ok(state)
    }
}

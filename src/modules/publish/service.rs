use tracing::{info, warn};

use super::dto::{PublishRequest, PublishResponse};
use crate::common::error::{ClipError, ClipResult};
use crate::infrastructure::google::VideoMetadata;
use crate::modules::stages::require_artifact_file;
use crate::state::AppState;

/// YouTube rejects longer titles.
pub const MAX_TITLE_CHARS: usize = 100;

pub struct PublishService;

impl PublishService {
    fn metadata(req: PublishRequest) -> ClipResult<VideoMetadata> {
        let title = req.title.map(|t| t.trim().to_string()).unwrap_or_default();
        let description = req.description.unwrap_or_default();
        let tags = req.tags.map(|t| t.normalize()).unwrap_or_default();

        if title.is_empty() || description.trim().is_empty() || tags.is_empty() {
            return Err(ClipError::precondition(
                "title, description and tags are required to publish",
            ));
        }
        if title.chars().count() > MAX_TITLE_CHARS {
            return Err(ClipError::validation(format!(
                "title must be at most {} characters",
                MAX_TITLE_CHARS
            )));
        }

        Ok(VideoMetadata {
            title,
            description,
            tags,
        })
    }

    /// Uploads the current artifact as a private video. The job record is never modified.
    pub async fn publish(state: AppState, id: i64, req: PublishRequest) -> ClipResult<PublishResponse> {
        let metadata = Self::metadata(req)?;

        // Held so no stage swaps the artifact mid-upload.
        let _guard = state.locks.acquire(id).await;
        let job = state.clips.get(id).await?;
        let artifact = job.current_artifact.require()?;
        let path = require_artifact_file(&state.stages, artifact).await?;

        let token = state.credentials.access_token().await?;

        info!("📤 Publishing clip {} ({}) as {:?}", id, artifact, metadata.title);
        match state.publisher.upload(&token, &path, &metadata).await {
            Ok(video_id) => Ok(PublishResponse {
                url: format!("https://www.youtube.com/watch?v={}", video_id),
                video_id,
            }),
            Err(ClipError::Unauthorized(msg)) => {
                warn!("Upload rejected the access token; forcing a refresh next time");
                state.credentials.mark_expired().await;
                Err(ClipError::Unauthorized(msg))
            }
            Err(e) => Err(e),
        }
    }
}

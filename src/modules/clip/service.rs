use std::path::PathBuf;

use tracing::info;
use validator::Validate;

use super::dto::{
    BurnSubtitlesRequest, CreateClipRequest, CropRequest, DEFAULT_OVERLAY_FONT_SIZE,
    DEFAULT_SUBTITLE_FONT_SIZE, OverlayTextRequest, StageResponse, parse_color,
};
use super::model::{Artifact, ClipJob};
use crate::common::color::HexColor;
use crate::common::error::{ClipError, ClipResult};
use crate::modules::stages::burn::{self, SubtitleStyle};
use crate::modules::stages::overlay::{self, OverlayStyle};
use crate::modules::stages::{CropRatio, crop, export};
use crate::modules::subtitle::compile;
use crate::state::AppState;

/// Stage commands. Each one holds the job's lock for its whole run and only
/// records the new artifact after the stage has produced it.
pub struct ClipService;

impl ClipService {
    pub async fn create(state: AppState, req: CreateClipRequest) -> ClipResult<ClipJob> {
        let new_job = req.into_new_job()?;
        let job = state.clips.create(new_job).await?;
        info!(
            "🆕 Clip {} created for {} [{} -> {}]",
            job.id, job.source_url, job.start_seconds, job.end_seconds
        );
        Ok(job)
    }

    pub async fn list(state: AppState) -> Vec<ClipJob> {
        state.clips.list().await
    }

    pub async fn get(state: AppState, id: i64) -> ClipResult<ClipJob> {
        state.clips.get(id).await
    }

    /// Artifact files stay on disk; only the ledger row goes.
    pub async fn delete(state: AppState, id: i64) -> ClipResult<()> {
        let guard = state.locks.acquire(id).await;
        state.clips.delete(id).await?;
        drop(guard);
        state.locks.forget(id);
        info!("🗑️ Clip {} deleted", id);
        Ok(())
    }

    pub async fn export(state: AppState, id: i64) -> ClipResult<StageResponse> {
        let _guard = state.locks.acquire(id).await;
        let job = state.clips.get(id).await?;
        let artifact = export::run(&state.stages, &job).await?;
        Self::commit(&state, id, artifact).await
    }

    pub async fn burn_subtitles(
        state: AppState,
        id: i64,
        req: BurnSubtitlesRequest,
    ) -> ClipResult<StageResponse> {
        req.validate()?;
        let style = SubtitleStyle {
            font_size: req.font_size.unwrap_or(DEFAULT_SUBTITLE_FONT_SIZE),
            text_color: parse_color(req.text_color.as_deref(), HexColor::WHITE)?,
            background_color: parse_color(req.background_color.as_deref(), HexColor::BLACK)?,
        };
        let policy = req.preroll_policy.unwrap_or(state.config.subtitle_preroll);

        let _guard = state.locks.acquire(id).await;
        let job = state.clips.get(id).await?;
        let artifact = job.current_artifact.require()?.to_string();

        let lines = req.transcript_lines.unwrap_or_else(|| job.transcript.clone());
        let document = compile(&lines, job.start_seconds, policy)?;

        let artifact = burn::run(&state.stages, &job, &artifact, &document, &style).await?;
        Self::commit(&state, id, artifact).await
    }

    pub async fn crop(state: AppState, id: i64, req: CropRequest) -> ClipResult<StageResponse> {
        let ratio: CropRatio = req.ratio.parse()?;

        let _guard = state.locks.acquire(id).await;
        let job = state.clips.get(id).await?;
        let artifact = job.current_artifact.require()?.to_string();

        let cropped = crop::run(&state.stages, &job, &artifact, ratio).await?;
        Self::commit(&state, id, cropped).await
    }

    pub async fn overlay_text(
        state: AppState,
        id: i64,
        req: OverlayTextRequest,
    ) -> ClipResult<StageResponse> {
        req.validate()?;
        let style = OverlayStyle {
            font_size: req.font_size.unwrap_or(DEFAULT_OVERLAY_FONT_SIZE),
            text_color: parse_color(req.text_color.as_deref(), HexColor::WHITE)?,
            background_color: parse_color(req.background_color.as_deref(), HexColor::BLACK)?,
            text: req.text,
        };

        let _guard = state.locks.acquire(id).await;
        let job = state.clips.get(id).await?;
        let artifact = job.current_artifact.require()?.to_string();

        let artifact = overlay::run(&state.stages, &job, &artifact, &style).await?;
        Self::commit(&state, id, artifact).await
    }

    /// Path and file name of the job's current artifact, for download.
    pub async fn artifact_file(state: AppState, id: i64) -> ClipResult<(PathBuf, String)> {
        let job = state.clips.get(id).await?;
        let name = job
            .current_artifact
            .file_name()
            .ok_or_else(|| ClipError::not_found(format!("clip {} has no exported file yet", id)))?
            .to_string();
        let path = state.stages.artifact_path(&name);
        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ClipError::not_found(format!("file {} is missing", name)));
        }
        Ok((path, name))
    }

    async fn commit(state: &AppState, id: i64, artifact: String) -> ClipResult<StageResponse> {
        let recorded = Artifact::Exported(artifact.clone());
        let job = state
            .clips
            .update(id, move |job| job.current_artifact = recorded)
            .await?;
        Ok(StageResponse { artifact, job })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::clip::model::TranscriptLine;
    use crate::testing::{FakeRunner, test_state};

    fn create_request() -> CreateClipRequest {
        serde_json::from_value(serde_json::json!({
            "sourceUrl": "https://example/video",
            "startSeconds": 10,
            "endSeconds": 25,
            "transcript": [
                {"time": "0:08", "text": "intro"},
                {"time": "0:12", "text": "hello"},
                {"time": "0:20", "text": "world"}
            ]
        }))
        .unwrap()
    }

    fn burn_request() -> BurnSubtitlesRequest {
        BurnSubtitlesRequest {
            background_color: Some("#000000".into()),
            text_color: Some("#FFFF00".into()),
            font_size: Some(28),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn end_to_end_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::with_streams();
        let state = test_state(dir.path(), runner.clone()).await;

        let job = ClipService::create(state.clone(), create_request()).await.unwrap();
        assert_eq!(job.current_artifact, Artifact::Unexported);

        let exported = ClipService::export(state.clone(), job.id).await.unwrap();
        assert_eq!(exported.artifact, format!("clip-{}.mp4", job.id));

        let burned = ClipService::burn_subtitles(state.clone(), job.id, burn_request())
            .await
            .unwrap();
        assert_eq!(burned.artifact, exported.artifact);
        let srt = std::fs::read_to_string(
            state.config.subtitles_dir.join(format!("{}.srt", job.id)),
        )
        .unwrap();
        assert!(srt.contains("1\n-00:00:02,000 --> 00:00:02,000\nintro"));
        assert!(srt.contains("2\n00:00:02,000 --> 00:00:10,000\nhello"));
        assert!(srt.contains("3\n00:00:10,000 --> 00:00:15,000\nworld"));

        let first = ClipService::crop(state.clone(), job.id, CropRequest { ratio: "1:1".into() })
            .await
            .unwrap();
        let second = ClipService::crop(state.clone(), job.id, CropRequest { ratio: "1:1".into() })
            .await
            .unwrap();
        assert_ne!(first.artifact, second.artifact);
        assert_eq!(
            second.job.current_artifact,
            Artifact::Exported(second.artifact.clone())
        );

        let overlaid = ClipService::overlay_text(
            state.clone(),
            job.id,
            OverlayTextRequest {
                text: "Watch till the end".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(overlaid.artifact, second.artifact);

        let (path, name) = ClipService::artifact_file(state.clone(), job.id).await.unwrap();
        assert_eq!(name, second.artifact);
        assert!(path.exists());
    }

    #[tokio::test]
    async fn stages_before_export_fail_precondition_and_leave_job_alone() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let state = test_state(dir.path(), runner.clone()).await;
        let job = ClipService::create(state.clone(), create_request()).await.unwrap();

        let burn = ClipService::burn_subtitles(state.clone(), job.id, burn_request()).await;
        let crop = ClipService::crop(state.clone(), job.id, CropRequest { ratio: "9:16".into() }).await;
        let overlay = ClipService::overlay_text(
            state.clone(),
            job.id,
            OverlayTextRequest {
                text: "hi".into(),
                ..Default::default()
            },
        )
        .await;

        for result in [burn, crop, overlay] {
            assert!(matches!(result, Err(ClipError::Precondition(_))));
        }
        assert_eq!(ClipService::get(state.clone(), job.id).await.unwrap(), job);
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn unknown_ratio_is_rejected_before_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let state = test_state(dir.path(), runner.clone()).await;

        let err = ClipService::crop(state, 42, CropRequest { ratio: "16:9".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ClipError::Validation(_)));
        assert!(runner.calls().is_empty());
    }

    #[tokio::test]
    async fn failed_stage_keeps_last_good_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::with_streams();
        let state = test_state(dir.path(), runner.clone()).await;
        let job = ClipService::create(state.clone(), create_request()).await.unwrap();
        let exported = ClipService::export(state.clone(), job.id).await.unwrap();

        runner.fail_when_arg_contains("crop=");
        let err = ClipService::crop(state.clone(), job.id, CropRequest { ratio: "9:16".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, ClipError::ToolFailure { .. }));

        let current = ClipService::get(state, job.id).await.unwrap();
        assert_eq!(current.current_artifact, Artifact::Exported(exported.artifact));
    }

    #[tokio::test]
    async fn explicit_lines_and_drop_policy_override_job_transcript() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::with_streams();
        let state = test_state(dir.path(), runner).await;
        let job = ClipService::create(state.clone(), create_request()).await.unwrap();
        ClipService::export(state.clone(), job.id).await.unwrap();

        let req = BurnSubtitlesRequest {
            transcript_lines: Some(vec![
                TranscriptLine {
                    timestamp_text: "0:05".into(),
                    text: "before".into(),
                },
                TranscriptLine {
                    timestamp_text: "0:11".into(),
                    text: "inside".into(),
                },
            ]),
            preroll_policy: Some(crate::modules::subtitle::PrerollPolicy::Drop),
            ..burn_request()
        };
        ClipService::burn_subtitles(state.clone(), job.id, req).await.unwrap();

        let srt = std::fs::read_to_string(
            state.config.subtitles_dir.join(format!("{}.srt", job.id)),
        )
        .unwrap();
        assert!(srt.starts_with("1\n00:00:01,000 --> 00:00:06,000\ninside"));
        assert!(!srt.contains("before"));
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(dir.path(), FakeRunner::default()).await;
        let job = ClipService::create(state.clone(), create_request()).await.unwrap();

        ClipService::delete(state.clone(), job.id).await.unwrap();
        assert!(ClipService::list(state.clone()).await.is_empty());
        assert!(matches!(
            ClipService::delete(state.clone(), job.id).await,
            Err(ClipError::NotFound(_))
        ));
        assert!(matches!(
            ClipService::artifact_file(state, job.id).await,
            Err(ClipError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn stages_on_one_job_never_overlap() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::with_streams();
        let state = test_state(dir.path(), runner.clone()).await;
        let job = ClipService::create(state.clone(), create_request()).await.unwrap();
        ClipService::export(state.clone(), job.id).await.unwrap();

        runner.set_delay(std::time::Duration::from_millis(100));
        let (cropped, overlaid) = tokio::join!(
            ClipService::crop(state.clone(), job.id, CropRequest { ratio: "9:16".into() }),
            ClipService::overlay_text(
                state.clone(),
                job.id,
                OverlayTextRequest {
                    text: "one at a time".into(),
                    ..Default::default()
                },
            ),
        );
        cropped.unwrap();
        overlaid.unwrap();
        assert_eq!(runner.peak_in_flight(), 1);
    }

    #[tokio::test]
    async fn stages_on_different_jobs_run_together() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::with_streams();
        let state = test_state(dir.path(), runner.clone()).await;
        let first = ClipService::create(state.clone(), create_request()).await.unwrap();
        let second = ClipService::create(state.clone(), create_request()).await.unwrap();
        ClipService::export(state.clone(), first.id).await.unwrap();
        ClipService::export(state.clone(), second.id).await.unwrap();

        runner.set_delay(std::time::Duration::from_millis(100));
        let (a, b) = tokio::join!(
            ClipService::crop(state.clone(), first.id, CropRequest { ratio: "1:1".into() }),
            ClipService::crop(state.clone(), second.id, CropRequest { ratio: "1:1".into() }),
        );
        a.unwrap();
        b.unwrap();
        assert_eq!(runner.peak_in_flight(), 2);
    }
}

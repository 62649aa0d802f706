//! Trim the marked window out of the remote streams and merge it into one file.

use tracing::info;

use super::StageContext;
use crate::common::error::{ClipError, ClipResult};
use crate::infrastructure::process::{FfmpegCommand, FfmpegInput};
use crate::modules::clip::model::ClipJob;

const VIDEO_CODEC: &str = "libx264";
const VIDEO_CRF: u8 = 18;
const VIDEO_PRESET: &str = "slow";
const VIDEO_SCALE: &str = "scale=1920:1080";
const AUDIO_CODEC: &str = "aac";
const AUDIO_BITRATE: &str = "192k";

/// Files written by one export, in the order they are produced.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportFiles {
    pub trimmed_video: String,
    pub trimmed_audio: String,
    pub merging: String,
    pub clip: String,
}

impl ExportFiles {
    pub fn for_job(id: i64) -> Self {
        Self {
            trimmed_video: format!("trimmed-video-{}.mp4", id),
            trimmed_audio: format!("trimmed-audio-{}.aac", id),
            merging: format!("merging-clip-{}.mp4", id),
            clip: format!("clip-{}.mp4", id),
        }
    }
}

/// Returns the merged clip's file name. Intermediate files from completed
/// steps stay on disk when a later step fails.
pub async fn run(ctx: &StageContext, job: &ClipJob) -> ClipResult<String> {
    let duration = job.duration();
    if !(duration > 0.0) {
        return Err(ClipError::validation(format!(
            "clip {} has an empty time range ({} -> {})",
            job.id, job.start_seconds, job.end_seconds
        )));
    }

    info!(
        "🎬 Exporting clip {}: {} [{:.3}s +{:.3}s]",
        job.id, job.source_url, job.start_seconds, duration
    );

    let streams = ctx.resolver.resolve(&job.source_url).await?;
    let files = ExportFiles::for_job(job.id);

    let trimmed_video = ctx.artifact_path(&files.trimmed_video);
    let video = FfmpegCommand::new(&trimmed_video)
        .input(
            FfmpegInput::new(&streams.video_url)
                .seek(job.start_seconds)
                .duration(duration),
        )
        .video_codec(VIDEO_CODEC)
        .crf(VIDEO_CRF)
        .preset(VIDEO_PRESET)
        .video_filter(VIDEO_SCALE)
        .output_arg("-an");
    ctx.run_ffmpeg("trim video", video).await?;

    let trimmed_audio = ctx.artifact_path(&files.trimmed_audio);
    let audio = FfmpegCommand::new(&trimmed_audio)
        .input(
            FfmpegInput::new(&streams.audio_url)
                .seek(job.start_seconds)
                .duration(duration),
        )
        .output_arg("-vn")
        .audio_codec(AUDIO_CODEC)
        .audio_bitrate(AUDIO_BITRATE);
    ctx.run_ffmpeg("trim audio", audio).await?;

    let merging = ctx.artifact_path(&files.merging);
    let merge = FfmpegCommand::new(&merging)
        .input(FfmpegInput::file(&trimmed_video))
        .input(FfmpegInput::file(&trimmed_audio))
        .output_args(["-map", "0:v:0", "-map", "1:a:0"])
        .video_codec("copy")
        .audio_codec(AUDIO_CODEC)
        .audio_bitrate(AUDIO_BITRATE)
        .shortest();
    ctx.run_ffmpeg("merge video and audio", merge).await?;

    ctx.replace_artifact(&merging, &ctx.artifact_path(&files.clip))
        .await?;

    info!("✅ Clip {} exported as {}", job.id, files.clip);
    Ok(files.clip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRunner, sample_job, stage_context};

    #[tokio::test]
    async fn runs_trim_trim_merge_and_leaves_final_file() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::with_streams();
        let ctx = stage_context(dir.path(), runner.clone());
        let job = sample_job(7);

        let clip = run(&ctx, &job).await.unwrap();
        assert_eq!(clip, "clip-7.mp4");
        assert!(ctx.artifact_path("clip-7.mp4").exists());
        assert!(!ctx.artifact_path("merging-clip-7.mp4").exists());

        let calls = runner.calls();
        assert_eq!(calls.len(), 4);
        assert_eq!(calls[0].tool_name(), "yt-dlp");

        let video_args = &calls[1].args;
        let seek = video_args.iter().position(|a| a == "-ss").unwrap();
        assert_eq!(video_args[seek + 1], "10.000");
        assert_eq!(video_args[seek + 3], "15.000");
        assert!(video_args.contains(&"https://media.example/video".to_string()));
        assert!(video_args.contains(&"libx264".to_string()));

        assert!(calls[2].args.contains(&"https://media.example/audio".to_string()));
        assert!(calls[3].args.contains(&"-shortest".to_string()));
    }

    #[tokio::test]
    async fn failed_audio_step_aborts_and_keeps_video_intermediate() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::with_streams();
        runner.fail_when_arg_contains("https://media.example/audio");
        let ctx = stage_context(dir.path(), runner.clone());

        let err = run(&ctx, &sample_job(7)).await.unwrap_err();
        assert!(matches!(err, ClipError::ToolFailure { .. }));
        assert!(ctx.artifact_path("trimmed-video-7.mp4").exists());
        assert!(!ctx.artifact_path("clip-7.mp4").exists());
        assert_eq!(runner.calls().len(), 3);
    }

    #[tokio::test]
    async fn single_stream_source_fails_resolution() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        runner.set_stdout("https://media.example/muxed\n");
        let ctx = stage_context(dir.path(), runner.clone());

        let err = run(&ctx, &sample_job(7)).await.unwrap_err();
        assert!(matches!(err, ClipError::Resolution(_)));
        assert_eq!(runner.calls().len(), 1);
    }

    #[tokio::test]
    async fn missing_output_is_a_tool_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::with_streams();
        runner.skip_outputs();
        let ctx = stage_context(dir.path(), runner);

        let err = run(&ctx, &sample_job(7)).await.unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}

//! Transformation stages. Each one reads a job, drives ffmpeg and returns
//! the file name that should become the job's artifact; the caller decides
//! when to record it.

pub mod burn;
pub mod crop;
pub mod export;
pub mod overlay;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::common::error::{ClipError, ClipResult};
use crate::config::settings::AppConfig;
use crate::infrastructure::extractor::StreamResolver;
use crate::infrastructure::process::invoker::stderr_tail;
use crate::infrastructure::process::{FfmpegCommand, ToolRunner};

pub use crop::CropRatio;

#[derive(Clone)]
pub struct StageContext {
    pub runner: Arc<dyn ToolRunner>,
    pub resolver: StreamResolver,
    pub ffmpeg: String,
    pub output_dir: PathBuf,
    pub subtitles_dir: PathBuf,
    pub font_file: Option<PathBuf>,
}

impl StageContext {
    pub fn new(config: &AppConfig, runner: Arc<dyn ToolRunner>) -> Self {
        Self {
            resolver: StreamResolver::new(runner.clone(), config.ytdlp_path.clone()),
            runner,
            ffmpeg: config.ffmpeg_path.clone(),
            output_dir: config.output_dir.clone(),
            subtitles_dir: config.subtitles_dir.clone(),
            font_file: config.font_file.clone(),
        }
    }

    pub fn artifact_path(&self, file_name: &str) -> PathBuf {
        self.output_dir.join(file_name)
    }

    /// Run one ffmpeg step and confirm it actually produced its output file.
    pub async fn run_ffmpeg(&self, step: &str, cmd: FfmpegCommand) -> ClipResult<()> {
        let output = cmd.output_path().to_path_buf();
        info!("▶️ {}", step);

        let result = self.runner.run(cmd.into_invocation(&self.ffmpeg)).await?;
        if !result.reached_end {
            debug!(
                "{}: ffmpeg exited cleanly without a progress end marker\n{}",
                step,
                stderr_tail(&result.stderr)
            );
        }

        ensure_exists(&output).await.map_err(|_| {
            ClipError::tool(
                "ffmpeg",
                format!("{} reported success but {} is missing", step, output.display()),
                None,
            )
        })
    }

    /// Move a freshly rendered temp file over the live artifact.
    pub async fn replace_artifact(&self, temp: &Path, target: &Path) -> ClipResult<()> {
        tokio::fs::rename(temp, target).await.map_err(|e| {
            ClipError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to replace {}: {}", target.display(), e),
            ))
        })
    }
}

async fn ensure_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::try_exists(path).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(std::io::ErrorKind::NotFound.into()),
        Err(e) => Err(e),
    }
}

/// The live artifact must be present on disk before a stage reads it.
pub async fn require_artifact_file(ctx: &StageContext, artifact: &str) -> ClipResult<PathBuf> {
    let path = ctx.artifact_path(artifact);
    ensure_exists(&path).await.map_err(|_| {
        ClipError::precondition(format!("artifact {} is missing from the output directory", artifact))
    })?;
    Ok(path)
}

/// Temp name used while re-rendering an artifact in place; keeps the extension for ffmpeg's muxer guess.
pub fn temp_name(artifact: &str) -> String {
    format!("temp-{}", artifact)
}

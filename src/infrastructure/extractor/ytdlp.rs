//! Direct media-stream lookup through yt-dlp.

use std::sync::Arc;

use tracing::{debug, info};

use crate::common::error::{ClipError, ClipResult};
use crate::infrastructure::process::{ToolInvocation, ToolRunner};

/// Time-limited direct URLs for the separate video and audio streams.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamLocators {
    pub video_url: String,
    pub audio_url: String,
}

#[derive(Clone)]
pub struct StreamResolver {
    runner: Arc<dyn ToolRunner>,
    program: String,
}

impl StreamResolver {
    pub fn new(runner: Arc<dyn ToolRunner>, program: impl Into<String>) -> Self {
        Self {
            runner,
            program: program.into(),
        }
    }

    pub fn invocation(&self, source_url: &str) -> ToolInvocation {
        // `--` keeps a hostile URL from being read as an option.
        ToolInvocation::new(
            self.program.clone(),
            [
                "-f",
                "bestvideo+bestaudio",
                "--get-url",
                "--no-playlist",
                "--no-warnings",
                "--",
                source_url,
            ],
        )
    }

    pub async fn resolve(&self, source_url: &str) -> ClipResult<StreamLocators> {
        info!("Resolving streams for {}", source_url);

        let output = self
            .runner
            .run(self.invocation(source_url))
            .await
            .map_err(|e| ClipError::Resolution(e.to_string()))?;

        let locators = parse_locators(&output.stdout)?;
        debug!("Video stream: {}", locators.video_url);
        debug!("Audio stream: {}", locators.audio_url);
        Ok(locators)
    }
}

fn parse_locators(stdout: &str) -> ClipResult<StreamLocators> {
    let mut lines = stdout.lines().map(str::trim).filter(|l| !l.is_empty());
    match (lines.next(), lines.next()) {
        (Some(video), Some(audio)) => Ok(StreamLocators {
            video_url: video.to_string(),
            audio_url: audio.to_string(),
        }),
        _ => Err(ClipError::Resolution(format!(
            "expected separate video and audio locators, got {} line(s)",
            stdout.lines().filter(|l| !l.trim().is_empty()).count()
        ))),
    }
}

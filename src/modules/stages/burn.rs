//! Burn a compiled subtitle track into the current artifact.

use tracing::info;

use super::{StageContext, require_artifact_file, temp_name};
use crate::common::color::HexColor;
use crate::common::error::{ClipError, ClipResult};
use crate::common::fs::write_atomic;
use crate::infrastructure::process::ffmpeg::{escape_filter_path, escape_filter_value};
use crate::infrastructure::process::{FfmpegCommand, FfmpegInput};
use crate::modules::clip::model::ClipJob;
use crate::modules::subtitle::SubtitleDocument;

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleStyle {
    pub font_size: u32,
    pub text_color: HexColor,
    pub background_color: HexColor,
}

impl SubtitleStyle {
    /// libass `force_style` override. `BorderStyle=3` draws the background as an opaque box.
    pub fn force_style(&self) -> String {
        let background = self.background_color.to_ass();
        format!(
            "FontSize={},PrimaryColour={},BackColour={},OutlineColour={},BorderStyle=3,Outline=2,Shadow=0,Alignment=2,MarginV=50",
            self.font_size,
            self.text_color.to_ass(),
            background,
            background
        )
    }
}

pub fn subtitle_filter(srt: &std::path::Path, style: &SubtitleStyle) -> String {
    format!(
        "subtitles=filename={}:force_style={}",
        escape_filter_path(srt),
        escape_filter_value(&style.force_style())
    )
}

/// Writes `<subtitles_dir>/<id>.srt`, renders into a temp file and renames it
/// over the artifact, so the artifact keeps its name.
pub async fn run(
    ctx: &StageContext,
    job: &ClipJob,
    artifact: &str,
    document: &SubtitleDocument,
    style: &SubtitleStyle,
) -> ClipResult<String> {
    if document.is_empty() {
        return Err(ClipError::validation("no subtitle lines to burn"));
    }

    let input = require_artifact_file(ctx, artifact).await?;

    tokio::fs::create_dir_all(&ctx.subtitles_dir).await?;
    let srt = ctx.subtitles_dir.join(format!("{}.srt", job.id));
    write_atomic(&srt, document.render().as_bytes()).await?;
    info!("📝 Wrote {} subtitle cue(s) to {}", document.cues.len(), srt.display());

    let temp = ctx.artifact_path(&temp_name(artifact));
    let cmd = FfmpegCommand::new(&temp)
        .input(FfmpegInput::file(&input))
        .video_filter(subtitle_filter(&srt, style))
        .audio_codec("copy");
    ctx.run_ffmpeg("burn subtitles", cmd).await?;

    ctx.replace_artifact(&temp, &input).await?;

    info!("✅ Subtitles burned into {}", artifact);
    Ok(artifact.to_string())
}

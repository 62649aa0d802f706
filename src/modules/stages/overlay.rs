//! Draw a persistent caption box over the current artifact.

use std::path::Path;

use tracing::info;

use super::{StageContext, require_artifact_file, temp_name};
use crate::common::color::HexColor;
use crate::common::error::{ClipError, ClipResult};
use crate::common::fs::write_atomic;
use crate::infrastructure::process::ffmpeg::escape_filter_path;
use crate::infrastructure::process::{FfmpegCommand, FfmpegInput};
use crate::modules::clip::model::ClipJob;

const BOX_OPACITY: &str = "0.9";
const BOX_BORDER: u32 = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct OverlayStyle {
    pub text: String,
    pub font_size: u32,
    pub text_color: HexColor,
    pub background_color: HexColor,
}

/// The caption is read from `text_file` with expansion disabled, so user text
/// never reaches the filter parser.
pub fn drawtext_filter(text_file: &Path, font_file: Option<&Path>, style: &OverlayStyle) -> String {
    let mut options = Vec::new();
    if let Some(font) = font_file {
        options.push(format!("fontfile={}", escape_filter_path(font)));
    }
    options.push(format!("textfile={}", escape_filter_path(text_file)));
    options.push("expansion=none".to_string());
    options.push(format!("fontsize={}", style.font_size));
    options.push(format!("fontcolor={}", style.text_color.to_ffmpeg()));
    // Horizontally centred, a fifth of the way down.
    options.push("x=(w-text_w)/2".to_string());
    options.push("y=(h-text_h)/5".to_string());
    options.push("box=1".to_string());
    options.push(format!(
        "boxcolor={}@{}",
        style.background_color.to_ffmpeg(),
        BOX_OPACITY
    ));
    options.push(format!("boxborderw={}", BOX_BORDER));

    format!("drawtext={}", options.join(":"))
}

pub async fn run(
    ctx: &StageContext,
    job: &ClipJob,
    artifact: &str,
    style: &OverlayStyle,
) -> ClipResult<String> {
    if style.text.trim().is_empty() {
        return Err(ClipError::validation("overlay text must not be empty"));
    }

    let input = require_artifact_file(ctx, artifact).await?;

    tokio::fs::create_dir_all(&ctx.subtitles_dir).await?;
    let text_file = ctx.subtitles_dir.join(format!("overlay-{}.txt", job.id));
    write_atomic(&text_file, style.text.as_bytes()).await?;

    info!("🔤 Overlaying {} char(s) of text on {}", style.text.chars().count(), artifact);

    let temp = ctx.artifact_path(&temp_name(artifact));
    let cmd = FfmpegCommand::new(&temp)
        .input(FfmpegInput::file(&input))
        .video_filter(drawtext_filter(&text_file, ctx.font_file.as_deref(), style))
        .audio_codec("copy");
    ctx.run_ffmpeg("overlay text", cmd).await?;

    ctx.replace_artifact(&temp, &input).await?;
    Ok(artifact.to_string())
}

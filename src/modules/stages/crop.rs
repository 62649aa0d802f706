//! Re-frame the current artifact for a target aspect ratio.

use std::fmt;
use std::str::FromStr;

use tracing::info;
use uuid::Uuid;

use super::{StageContext, require_artifact_file};
use crate::common::error::{ClipError, ClipResult};
use crate::infrastructure::process::{FfmpegCommand, FfmpegInput};
use crate::modules::clip::model::ClipJob;

const SQUARE_SIZE: u32 = 1080;
const PORTRAIT_BOX: (u32, u32) = (1080, 1920);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CropRatio {
    /// Full-height centre cut, width = height * 9/16.
    Portrait,
    /// Centred square scaled to 1080x1080.
    Square,
    /// Fit inside 1080x1920 and pad the rest black.
    Center,
}

impl CropRatio {
    pub fn filter(self) -> String {
        match self {
            // Width rounded down to an even number for yuv420p.
            CropRatio::Portrait => "crop=w='trunc(ih*9/16/2)*2':h=ih".to_string(),
            CropRatio::Square => format!(
                "crop=w='min(iw,ih)':h='min(iw,ih)',scale={0}:{0}",
                SQUARE_SIZE
            ),
            CropRatio::Center => {
                let (w, h) = PORTRAIT_BOX;
                format!(
                    "scale={w}:{h}:force_original_aspect_ratio=decrease:force_divisible_by=2,pad={w}:{h}:(ow-iw)/2:(oh-ih)/2:black"
                )
            }
        }
    }
}

impl FromStr for CropRatio {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "9:16" => Ok(CropRatio::Portrait),
            "1:1" => Ok(CropRatio::Square),
            "center" => Ok(CropRatio::Center),
            other => Err(ClipError::validation(format!(
                "invalid ratio {other:?}, expected one of 9:16, 1:1, center"
            ))),
        }
    }
}

impl fmt::Display for CropRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CropRatio::Portrait => "9:16",
            CropRatio::Square => "1:1",
            CropRatio::Center => "center",
        })
    }
}

/// Each crop writes a new file; the previous artifact stays on disk.
pub fn output_name(job_id: i64) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("cropped-{}-{}.mp4", job_id, &suffix[..8])
}

pub async fn run(
    ctx: &StageContext,
    job: &ClipJob,
    artifact: &str,
    ratio: CropRatio,
) -> ClipResult<String> {
    let input = require_artifact_file(ctx, artifact).await?;
    let name = output_name(job.id);

    info!("✂️ Cropping clip {} to {} as {}", job.id, ratio, name);

    let cmd = FfmpegCommand::new(ctx.artifact_path(&name))
        .input(FfmpegInput::file(&input))
        .video_filter(ratio.filter())
        .video_codec("libx264")
        .crf(18)
        .audio_codec("copy");
    ctx.run_ffmpeg("crop", cmd).await?;

    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRunner, sample_job, stage_context};

    #[test]
    fn parses_supported_ratios_only() {
        assert_eq!("9:16".parse::<CropRatio>().unwrap(), CropRatio::Portrait);
        assert_eq!("1:1".parse::<CropRatio>().unwrap(), CropRatio::Square);
        assert_eq!("center".parse::<CropRatio>().unwrap(), CropRatio::Center);
        assert!(matches!("16:9".parse::<CropRatio>(), Err(ClipError::Validation(_))));
    }

    #[test]
    fn square_filter_crops_then_scales_to_1080() {
        let filter = CropRatio::Square.filter();
        assert!(filter.starts_with("crop=w='min(iw,ih)':h='min(iw,ih)'"));
        assert!(filter.ends_with("scale=1080:1080"));
    }

    #[test]
    fn center_filter_fits_then_pads() {
        let filter = CropRatio::Center.filter();
        assert!(filter.contains("force_original_aspect_ratio=decrease"));
        assert!(filter.contains("pad=1080:1920:(ow-iw)/2:(oh-ih)/2:black"));
    }

    #[tokio::test]
    async fn each_run_writes_a_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let ctx = stage_context(dir.path(), runner.clone());
        std::fs::write(ctx.artifact_path("clip-7.mp4"), b"original").unwrap();
        let job = sample_job(7);

        let first = run(&ctx, &job, "clip-7.mp4", CropRatio::Square).await.unwrap();
        let second = run(&ctx, &job, "clip-7.mp4", CropRatio::Square).await.unwrap();

        assert_ne!(first, second);
        assert!(first.starts_with("cropped-7-"));
        assert!(ctx.artifact_path(&first).exists());
        assert!(ctx.artifact_path(&second).exists());
        assert!(ctx.artifact_path("clip-7.mp4").exists());
        assert_eq!(runner.calls().len(), 2);
    }

    #[tokio::test]
    async fn missing_artifact_file_is_a_precondition_failure() {
        let dir = tempfile::tempdir().unwrap();
        let runner = FakeRunner::default();
        let ctx = stage_context(dir.path(), runner.clone());
        let err = run(&ctx, &sample_job(7), "gone.mp4", CropRatio::Center)
            .await
            .unwrap_err();
        assert!(matches!(err, ClipError::Precondition(_)));
        assert!(runner.calls().is_empty());
    }
}

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use super::model::{ClipJob, NewClipJob, TranscriptLine};
use crate::common::color::HexColor;
use crate::common::error::{ClipError, ClipResult};
use crate::common::timecode::parse_timestamp;
use crate::modules::subtitle::PrerollPolicy;

pub const DEFAULT_SUBTITLE_FONT_SIZE: u32 = 24;
pub const DEFAULT_OVERLAY_FONT_SIZE: u32 = 48;

/// Seconds as a number, or `S` / `M:S` / `H:M:S` text.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(f64),
    Text(String),
}

impl TimeValue {
    pub fn seconds(&self, field: &str) -> ClipResult<f64> {
        let value = match self {
            TimeValue::Seconds(s) => *s,
            TimeValue::Text(text) => parse_timestamp(text)
                .map_err(|e| ClipError::validation(format!("{}: {}", field, e)))?,
        };
        if !value.is_finite() || value < 0.0 {
            return Err(ClipError::validation(format!(
                "{} must be a non-negative number of seconds",
                field
            )));
        }
        Ok(value)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClipRequest {
    #[serde(alias = "url")]
    #[validate(
        required(message = "sourceUrl is required"),
        url(message = "sourceUrl must be an absolute URL")
    )]
    pub source_url: Option<String>,
    #[serde(alias = "start")]
    pub start_seconds: Option<TimeValue>,
    #[serde(alias = "end")]
    pub end_seconds: Option<TimeValue>,
    #[serde(default)]
    pub transcript: Option<Vec<TranscriptLine>>,
    pub crop_width: Option<u32>,
    pub crop_height: Option<u32>,
    pub aspect_ratio: Option<String>,
}

impl CreateClipRequest {
    pub fn into_new_job(self) -> ClipResult<NewClipJob> {
        self.validate()?;

        let source_url = self
            .source_url
            .ok_or_else(|| ClipError::validation("sourceUrl is required"))?;
        let start = self
            .start_seconds
            .ok_or_else(|| ClipError::validation("startSeconds is required"))?
            .seconds("startSeconds")?;
        let end = self
            .end_seconds
            .ok_or_else(|| ClipError::validation("endSeconds is required"))?
            .seconds("endSeconds")?;

        if end <= start {
            return Err(ClipError::validation(format!(
                "endSeconds ({}) must be greater than startSeconds ({})",
                end, start
            )));
        }

        Ok(NewClipJob {
            source_url,
            start_seconds: start,
            end_seconds: end,
            transcript: self.transcript.unwrap_or_default(),
            crop_width: self.crop_width,
            crop_height: self.crop_height,
            aspect_ratio: self.aspect_ratio,
        })
    }
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BurnSubtitlesRequest {
    /// Defaults to the transcript recorded on the job.
    #[serde(alias = "subtitleText")]
    pub transcript_lines: Option<Vec<TranscriptLine>>,
    #[serde(alias = "bgColor")]
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    #[serde(alias = "fontsize")]
    #[validate(range(min = 8, max = 200, message = "fontSize must be between 8 and 200"))]
    pub font_size: Option<u32>,
    /// Overrides the configured handling of lines before the clip start.
    pub preroll_policy: Option<PrerollPolicy>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CropRequest {
    /// One of `9:16`, `1:1`, `center`.
    pub ratio: String,
}

#[derive(Debug, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OverlayTextRequest {
    #[serde(alias = "additionalText")]
    #[validate(length(min = 1, max = 500, message = "text must be 1 to 500 characters"))]
    pub text: String,
    #[serde(alias = "bgColor")]
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    #[serde(alias = "fontsize")]
    #[validate(range(min = 8, max = 200, message = "fontSize must be between 8 and 200"))]
    pub font_size: Option<u32>,
}

pub fn parse_color(raw: Option<&str>, default: HexColor) -> ClipResult<HexColor> {
    match raw {
        Some(value) if !value.trim().is_empty() => value.parse(),
        _ => Ok(default),
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipCreatedResponse {
    pub id: i64,
}

/// Result of any stage: the updated job and the artifact it now points at.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub artifact: String,
    pub job: ClipJob,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_extension_field_names_and_text_times() {
        let req: CreateClipRequest = serde_json::from_str(
            r#"{"url":"https://example/video","start":"0:10","end":25,"transcript":[{"time":"0:08","text":"intro"}]}"#,
        )
        .unwrap();
        let job = req.into_new_job().unwrap();
        assert_eq!(job.start_seconds, 10.0);
        assert_eq!(job.end_seconds, 25.0);
        assert_eq!(job.transcript[0].timestamp_text, "0:08");
    }

    #[test]
    fn missing_fields_are_validation_errors() {
        for body in [
            r#"{"start":1,"end":2}"#,
            r#"{"sourceUrl":"https://example/v","end":2}"#,
            r#"{"sourceUrl":"https://example/v","start":1}"#,
        ] {
            let req: CreateClipRequest = serde_json::from_str(body).unwrap();
            assert!(matches!(req.into_new_job(), Err(ClipError::Validation(_))), "{body}");
        }
    }

    #[test]
    fn end_must_follow_start() {
        let req: CreateClipRequest =
            serde_json::from_str(r#"{"sourceUrl":"https://example/v","startSeconds":5,"endSeconds":5}"#)
                .unwrap();
        assert!(matches!(req.into_new_job(), Err(ClipError::Validation(_))));
    }

    #[test]
    fn subtitle_request_reads_legacy_names() {
        let req: BurnSubtitlesRequest = serde_json::from_str(
            r##"{"subtitleText":[{"time":"0:12","text":"hello"}],"bgColor":"#000000","textColor":"#FFFFFF","fontsize":30}"##,
        )
        .unwrap();
        assert_eq!(req.font_size, Some(30));
        assert_eq!(req.background_color.as_deref(), Some("#000000"));
        assert_eq!(req.transcript_lines.unwrap().len(), 1);
    }

    #[test]
    fn blank_color_falls_back_to_default() {
        assert_eq!(parse_color(None, HexColor::WHITE).unwrap(), HexColor::WHITE);
        assert_eq!(parse_color(Some(""), HexColor::BLACK).unwrap(), HexColor::BLACK);
        assert!(parse_color(Some("red"), HexColor::BLACK).is_err());
    }
}

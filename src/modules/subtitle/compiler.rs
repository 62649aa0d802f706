//! Transcript lines to SubRip, rebased onto the clip's start.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::common::error::{ClipError, ClipResult};
use crate::common::timecode::{format_srt_time, parse_timestamp};
use crate::modules::clip::model::TranscriptLine;

/// Display time given to the final line, which has no successor to end it.
pub const LAST_CUE_SECONDS: f64 = 5.0;

/// What to do with transcript lines that start before the marked clip start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PrerollPolicy {
    /// Keep the rebased (negative) timestamps as they are.
    #[default]
    Retain,
    /// Pull negative times up to zero; cues that end up empty are dropped.
    Clamp,
    /// Remove cues that start before zero.
    Drop,
}

impl FromStr for PrerollPolicy {
    type Err = ClipError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "retain" => Ok(PrerollPolicy::Retain),
            "clamp" => Ok(PrerollPolicy::Clamp),
            "drop" => Ok(PrerollPolicy::Drop),
            other => Err(ClipError::validation(format!(
                "unknown pre-roll policy {other:?}, expected retain, clamp or drop"
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub index: usize,
    pub start: f64,
    pub end: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SubtitleDocument {
    pub cues: Vec<SubtitleCue>,
}

impl SubtitleDocument {
    pub fn is_empty(&self) -> bool {
        self.cues.is_empty()
    }

    pub fn render(&self) -> String {
        let mut out = self
            .cues
            .iter()
            .map(|cue| {
                format!(
                    "{}\n{} --> {}\n{}",
                    cue.index,
                    format_srt_time(cue.start),
                    format_srt_time(cue.end),
                    cue.text
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out
    }
}

/// Build the subtitle track for a clip starting at `clip_start` seconds of the source.
///
/// Each cue ends where the next line starts; the last one runs for
/// [`LAST_CUE_SECONDS`].
pub fn compile(
    lines: &[TranscriptLine],
    clip_start: f64,
    policy: PrerollPolicy,
) -> ClipResult<SubtitleDocument> {
    let starts = lines
        .iter()
        .map(|line| Ok(parse_timestamp(&line.timestamp_text)? - clip_start))
        .collect::<ClipResult<Vec<f64>>>()?;

    let mut cues = Vec::with_capacity(lines.len());
    for (i, line) in lines.iter().enumerate() {
        let start = starts[i];
        let end = starts.get(i + 1).copied().unwrap_or(start + LAST_CUE_SECONDS);

        let (start, end) = match policy {
            PrerollPolicy::Retain => (start, end),
            PrerollPolicy::Drop if start < 0.0 => continue,
            PrerollPolicy::Drop => (start, end),
            PrerollPolicy::Clamp => {
                let (start, end) = (start.max(0.0), end.max(0.0));
                if end <= start {
                    continue;
                }
                (start, end)
            }
        };

        cues.push(SubtitleCue {
            index: cues.len() + 1,
            start,
            end,
            text: normalize_text(&line.text),
        });
    }

    Ok(SubtitleDocument { cues })
}

/// Blank lines would terminate a SubRip entry early.
fn normalize_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

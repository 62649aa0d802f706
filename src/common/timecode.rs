//! Conversions between clock-style text, seconds and SubRip timestamps.

use thiserror::Error;

use crate::common::error::ClipError;

#[derive(Debug, Error, PartialEq)]
#[error("unparseable timestamp {0:?}: expected S, M:S or H:M:S")]
pub struct TimecodeError(pub String);

impl From<TimecodeError> for ClipError {
    fn from(err: TimecodeError) -> Self {
        ClipError::Validation(err.to_string())
    }
}

/// Parse `S`, `M:S` or `H:M:S` into seconds. The last component may be fractional.
pub fn parse_timestamp(text: &str) -> Result<f64, TimecodeError> {
    let trimmed = text.trim();
    let fail = || TimecodeError(text.to_string());

    if trimmed.is_empty() {
        return Err(fail());
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    if parts.len() > 3 {
        return Err(fail());
    }

    let last = parts.len() - 1;
    let mut seconds = 0.0;
    for (i, part) in parts.iter().enumerate() {
        let part = part.trim();
        // Only the seconds component may carry a fraction.
        let value: f64 = if i == last {
            part.parse().map_err(|_| fail())?
        } else {
            part.parse::<u64>().map_err(|_| fail())? as f64
        };
        if !value.is_finite() || value < 0.0 {
            return Err(fail());
        }
        seconds = seconds * 60.0 + value;
    }

    Ok(seconds)
}

/// Render seconds as `HH:MM:SS,mmm`, rounded to the millisecond.
///
/// Negative input only arises from rebasing pre-roll transcript lines; it is
/// rendered as the magnitude with a leading `-`.
pub fn format_srt_time(seconds: f64) -> String {
    let total_ms = (seconds * 1000.0).round() as i64;
    let sign = if total_ms < 0 { "-" } else { "" };
    let ms = total_ms.unsigned_abs();

    let hours = ms / 3_600_000;
    let minutes = (ms % 3_600_000) / 60_000;
    let secs = (ms % 60_000) / 1000;
    let millis = ms % 1000;

    format!("{}{:02}:{:02}:{:02},{:03}", sign, hours, minutes, secs, millis)
}

use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::common::error::{ClipError, ClipResult};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptLine {
    #[serde(alias = "time")]
    pub timestamp_text: String,
    pub text: String,
}

/// Which file the next stage operates on.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Artifact {
    #[default]
    Unexported,
    Exported(String),
}

impl Artifact {
    /// File name of the current artifact, or a precondition failure when no export has succeeded yet.
    pub fn require(&self) -> ClipResult<&str> {
        match self {
            Artifact::Exported(name) => Ok(name),
            Artifact::Unexported => Err(ClipError::precondition(
                "clip has not been exported yet; run export first",
            )),
        }
    }

    pub fn file_name(&self) -> Option<&str> {
        match self {
            Artifact::Exported(name) => Some(name),
            Artifact::Unexported => None,
        }
    }
}

impl From<Option<String>> for Artifact {
    fn from(value: Option<String>) -> Self {
        match value {
            Some(name) if !name.is_empty() => Artifact::Exported(name),
            _ => Artifact::Unexported,
        }
    }
}

impl Serialize for Artifact {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.file_name().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Artifact {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(Option::<String>::deserialize(deserializer)?.into())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ClipJob {
    pub id: i64,
    #[serde(alias = "url")]
    pub source_url: String,
    #[serde(alias = "start")]
    pub start_seconds: f64,
    #[serde(alias = "end")]
    pub end_seconds: f64,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub transcript: Vec<TranscriptLine>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub crop_height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, alias = "outputFileName")]
    #[schema(value_type = Option<String>)]
    pub current_artifact: Artifact,
    #[serde(default, with = "time::serde::iso8601::option")]
    #[schema(value_type = Option<String>, format = DateTime)]
    pub created_at: Option<OffsetDateTime>,
}

impl ClipJob {
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Fields supplied by a clip request; the store assigns the rest.
#[derive(Debug, Clone)]
pub struct NewClipJob {
    pub source_url: String,
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub transcript: Vec<TranscriptLine>,
    pub crop_width: Option<u32>,
    pub crop_height: Option<u32>,
    pub aspect_ratio: Option<String>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<TranscriptLine>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<TranscriptLine>>::deserialize(deserializer)?.unwrap_or_default())
}

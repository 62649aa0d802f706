use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tags as `"a, b, c"` or `["a", "b", "c"]`.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum TagsInput {
    Joined(String),
    List(Vec<String>),
}

impl TagsInput {
    /// Trimmed, non-empty tags.
    pub fn normalize(&self) -> Vec<String> {
        let raw: Vec<&str> = match self {
            TagsInput::Joined(s) => s.split(',').collect(),
            TagsInput::List(items) => items.iter().map(String::as_str).collect(),
        };
        raw.into_iter()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<TagsInput>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PublishResponse {
    pub video_id: String,
    pub url: String,
}

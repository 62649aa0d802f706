//! YouTube Data API resumable upload.

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Body, StatusCode, header};
use serde::Deserialize;
use serde_json::json;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::common::error::{ClipError, ClipResult};

/// Uploads are always created private; the operator publishes from the studio.
pub const PRIVACY_STATUS: &str = "private";

#[derive(Debug, Clone, PartialEq)]
pub struct VideoMetadata {
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
}

#[async_trait]
pub trait VideoPublisher: Send + Sync {
    /// Upload `file` and return the remote video id.
    async fn upload(
        &self,
        access_token: &str,
        file: &Path,
        metadata: &VideoMetadata,
    ) -> ClipResult<String>;
}

#[derive(Deserialize)]
struct InsertedVideo {
    id: String,
}

pub struct YouTubePublisher {
    http: reqwest::Client,
    upload_url: String,
}

impl YouTubePublisher {
    pub fn new(http: reqwest::Client, upload_url: impl Into<String>) -> Self {
        Self {
            http,
            upload_url: upload_url.into(),
        }
    }

    async fn start_session(
        &self,
        access_token: &str,
        content_type: &str,
        length: u64,
        metadata: &VideoMetadata,
    ) -> ClipResult<String> {
        let response = self
            .http
            .post(&self.upload_url)
            .query(&[("uploadType", "resumable"), ("part", "snippet,status")])
            .bearer_auth(access_token)
            .header("X-Upload-Content-Type", content_type)
            .header("X-Upload-Content-Length", length.to_string())
            .json(&insert_body(metadata))
            .send()
            .await
            .map_err(|e| ClipError::Remote(format!("upload service unreachable: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(upload_error(status, &body));
        }

        response
            .headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .ok_or_else(|| ClipError::Remote("upload session response had no Location header".into()))
    }
}

#[async_trait]
impl VideoPublisher for YouTubePublisher {
    async fn upload(
        &self,
        access_token: &str,
        file: &Path,
        metadata: &VideoMetadata,
    ) -> ClipResult<String> {
        let length = tokio::fs::metadata(file).await?.len();
        let content_type = mime_guess::from_path(file)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        let session = self
            .start_session(access_token, &content_type, length, metadata)
            .await?;
        debug!("Upload session opened for {} ({} bytes)", file.display(), length);

        let reader = tokio::fs::File::open(file).await?;
        let response = self
            .http
            .put(&session)
            .bearer_auth(access_token)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CONTENT_LENGTH, length.to_string())
            .body(Body::wrap_stream(ReaderStream::new(reader)))
            .send()
            .await
            .map_err(|e| ClipError::Remote(format!("upload interrupted: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClipError::Remote(format!("failed to read upload response: {}", e)))?;
        if !status.is_success() {
            return Err(upload_error(status, &body));
        }

        let video: InsertedVideo = serde_json::from_str(&body)
            .map_err(|e| ClipError::Remote(format!("malformed upload response: {}", e)))?;
        info!("📤 Uploaded {} as video {}", file.display(), video.id);
        Ok(video.id)
    }
}

fn insert_body(metadata: &VideoMetadata) -> serde_json::Value {
    json!({
        "snippet": {
            "title": metadata.title,
            "description": metadata.description,
            "tags": metadata.tags,
        },
        "status": {
            "privacyStatus": PRIVACY_STATUS,
        },
    })
}

fn upload_error(status: StatusCode, body: &str) -> ClipError {
    let excerpt: String = body.chars().take(300).collect();
    if status == StatusCode::UNAUTHORIZED {
        ClipError::Unauthorized(format!("upload rejected the access token: {}", excerpt))
    } else {
        ClipError::Remote(format!("upload failed with {}: {}", status, excerpt))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_body_is_private_with_tags() {
        let body = insert_body(&VideoMetadata {
            title: "My clip".into(),
            description: "desc".into(),
            tags: vec!["a".into(), "b".into()],
        });
        assert_eq!(body["status"]["privacyStatus"], "private");
        assert_eq!(body["snippet"]["tags"], json!(["a", "b"]));
        assert_eq!(body["snippet"]["title"], "My clip");
    }

    #[test]
    fn unauthorized_upload_is_distinct_from_remote_failure() {
        assert!(matches!(
            upload_error(StatusCode::UNAUTHORIZED, "{}"),
            ClipError::Unauthorized(_)
        ));
        assert!(matches!(
            upload_error(StatusCode::FORBIDDEN, "quotaExceeded"),
            ClipError::Remote(_)
        ));
    }

    mod http {
        use super::*;
        use wiremock::matchers::{body_string_contains, header, method, path, query_param};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        fn metadata() -> VideoMetadata {
            VideoMetadata {
                title: "My clip".into(),
                description: "desc".into(),
                tags: vec!["clip".into()],
            }
        }

        fn clip_file(dir: &Path) -> std::path::PathBuf {
            let file = dir.join("clip-1.mp4");
            std::fs::write(&file, vec![7u8; 4096]).unwrap();
            file
        }

        async fn mount_session(server: &MockServer) {
            Mock::given(method("POST"))
                .and(path("/upload"))
                .and(query_param("uploadType", "resumable"))
                .and(header("authorization", "Bearer tok"))
                .and(header("x-upload-content-length", "4096"))
                .and(body_string_contains("\"privacyStatus\":\"private\""))
                .respond_with(
                    ResponseTemplate::new(200)
                        .insert_header("Location", format!("{}/session/abc", server.uri()).as_str()),
                )
                .expect(1)
                .mount(server)
                .await;
        }

        #[tokio::test]
        async fn uploads_file_through_resumable_session() {
            let server = MockServer::start().await;
            mount_session(&server).await;
            Mock::given(method("PUT"))
                .and(path("/session/abc"))
                .and(header("content-type", "video/mp4"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "vid123"})))
                .expect(1)
                .mount(&server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let file = clip_file(dir.path());
            let publisher = YouTubePublisher::new(reqwest::Client::new(), format!("{}/upload", server.uri()));

            let id = publisher.upload("tok", &file, &metadata()).await.unwrap();
            assert_eq!(id, "vid123");

            let requests = server.received_requests().await.unwrap();
            let put = requests.iter().find(|r| r.method.as_str() == "PUT").unwrap();
            assert_eq!(put.body.len(), 4096);
        }

        #[tokio::test]
        async fn session_without_location_is_remote_error() {
            let server = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/upload"))
                .respond_with(ResponseTemplate::new(200))
                .mount(&server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let file = clip_file(dir.path());
            let publisher = YouTubePublisher::new(reqwest::Client::new(), format!("{}/upload", server.uri()));

            let err = publisher.upload("tok", &file, &metadata()).await.unwrap_err();
            assert!(matches!(err, ClipError::Remote(_)));
        }

        #[tokio::test]
        async fn rejected_token_on_put_is_unauthorized() {
            let server = MockServer::start().await;
            mount_session(&server).await;
            Mock::given(method("PUT"))
                .and(path("/session/abc"))
                .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"invalid credentials\"}"))
                .mount(&server)
                .await;

            let dir = tempfile::tempdir().unwrap();
            let file = clip_file(dir.path());
            let publisher = YouTubePublisher::new(reqwest::Client::new(), format!("{}/upload", server.uri()));

            let err = publisher.upload("tok", &file, &metadata()).await.unwrap_err();
            assert!(matches!(err, ClipError::Unauthorized(_)));
        }
    }
}

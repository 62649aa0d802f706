//! Fakes and fixtures shared by unit tests.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::common::error::{ClipError, ClipResult};
use crate::config::settings::AppConfig;
use crate::infrastructure::google::{OAuthClient, TokenGrant, VideoMetadata, VideoPublisher};
use crate::infrastructure::process::invoker::ToolOutput;
use crate::infrastructure::process::{ToolInvocation, ToolRunner};
use crate::modules::auth::model::StoredCredential;
use crate::modules::auth::service::CredentialManager;
use crate::modules::clip::model::{Artifact, ClipJob, TranscriptLine};
use crate::modules::clip::repository::ClipRepository;
use crate::modules::stages::StageContext;
use crate::state::AppState;

#[derive(Default)]
struct RunnerState {
    calls: Vec<ToolInvocation>,
    stdout: String,
    fail_on: Option<String>,
    skip_outputs: bool,
    delay: Option<Duration>,
    in_flight: usize,
    peak_in_flight: usize,
}

/// Records every invocation. ffmpeg calls "succeed" by writing a small file
/// at the output path (the last argument).
#[derive(Clone, Default)]
pub struct FakeRunner {
    state: Arc<Mutex<RunnerState>>,
}

impl FakeRunner {
    pub fn with_streams() -> Self {
        let runner = Self::default();
        runner.set_stdout("https://media.example/video\nhttps://media.example/audio\n");
        runner
    }

    pub fn set_stdout(&self, stdout: &str) {
        self.state.lock().unwrap().stdout = stdout.to_string();
    }

    pub fn fail_when_arg_contains(&self, needle: &str) {
        self.state.lock().unwrap().fail_on = Some(needle.to_string());
    }

    pub fn skip_outputs(&self) {
        self.state.lock().unwrap().skip_outputs = true;
    }

    /// Every call sleeps for `delay` while counted as in flight.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = Some(delay);
    }

    pub fn peak_in_flight(&self) -> usize {
        self.state.lock().unwrap().peak_in_flight
    }

    pub fn calls(&self) -> Vec<ToolInvocation> {
        self.state.lock().unwrap().calls.clone()
    }
}

#[async_trait]
impl ToolRunner for FakeRunner {
    async fn run(&self, invocation: ToolInvocation) -> ClipResult<ToolOutput> {
        let (stdout, fail, skip, delay) = {
            let mut state = self.state.lock().unwrap();
            state.calls.push(invocation.clone());
            state.in_flight += 1;
            state.peak_in_flight = state.peak_in_flight.max(state.in_flight);
            let fail = state
                .fail_on
                .as_ref()
                .is_some_and(|needle| invocation.args.iter().any(|a| a.contains(needle.as_str())));
            (state.stdout.clone(), fail, state.skip_outputs, state.delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.state.lock().unwrap().in_flight -= 1;

        if fail {
            return Err(ClipError::tool(
                invocation.tool_name(),
                "exited with status 1",
                Some("fake failure".into()),
            ));
        }

        if invocation.tool_name() == "ffmpeg" && !skip {
            if let Some(output) = invocation.args.last() {
                std::fs::write(output, b"fake-media")?;
            }
        }

        Ok(ToolOutput {
            stdout,
            stderr: "progress=end\n".into(),
            reached_end: true,
        })
    }
}

#[derive(Default)]
struct OAuthState {
    refresh_calls: usize,
    reject_refresh: bool,
}

#[derive(Clone, Default)]
pub struct FakeOAuth {
    state: Arc<Mutex<OAuthState>>,
}

impl FakeOAuth {
    pub fn reject_refresh(&self) {
        self.state.lock().unwrap().reject_refresh = true;
    }

    pub fn refresh_calls(&self) -> usize {
        self.state.lock().unwrap().refresh_calls
    }
}

fn grant(token: &str, refresh: Option<&str>) -> TokenGrant {
    TokenGrant {
        access_token: token.into(),
        refresh_token: refresh.map(str::to_string),
        expires_in: Some(3599),
        scope: Some(crate::infrastructure::google::oauth::UPLOAD_SCOPE.into()),
        token_type: Some("Bearer".into()),
    }
}

#[async_trait]
impl OAuthClient for FakeOAuth {
    fn authorization_url(&self, state: &str) -> ClipResult<String> {
        Ok(format!("https://accounts.example/auth?state={}", state))
    }

    async fn exchange_code(&self, _code: &str) -> ClipResult<TokenGrant> {
        Ok(grant("exchanged-token", Some("new-refresh")))
    }

    async fn refresh(&self, _refresh_token: &str) -> ClipResult<TokenGrant> {
        let mut state = self.state.lock().unwrap();
        state.refresh_calls += 1;
        if state.reject_refresh {
            return Err(ClipError::Unauthorized("grant rejected (invalid_grant)".into()));
        }
        Ok(grant("fresh-token", None))
    }
}

#[derive(Default)]
struct PublisherState {
    uploads: Vec<(String, PathBuf, VideoMetadata)>,
    failure: Option<ClipError>,
}

#[derive(Clone, Default)]
pub struct FakePublisher {
    state: Arc<Mutex<PublisherState>>,
}

impl FakePublisher {
    /// The next upload fails with `err`.
    pub fn fail_with(&self, err: ClipError) {
        self.state.lock().unwrap().failure = Some(err);
    }

    pub fn uploads(&self) -> Vec<(String, PathBuf, VideoMetadata)> {
        self.state.lock().unwrap().uploads.clone()
    }
}

#[async_trait]
impl VideoPublisher for FakePublisher {
    async fn upload(
        &self,
        access_token: &str,
        file: &Path,
        metadata: &VideoMetadata,
    ) -> ClipResult<String> {
        let mut state = self.state.lock().unwrap();
        if let Some(err) = state.failure.take() {
            return Err(err);
        }
        state
            .uploads
            .push((access_token.to_string(), file.to_path_buf(), metadata.clone()));
        Ok(format!("remote-{}", state.uploads.len()))
    }
}

pub fn sample_transcript() -> Vec<TranscriptLine> {
    [("0:08", "intro"), ("0:12", "hello"), ("0:20", "world")]
        .into_iter()
        .map(|(time, text)| TranscriptLine {
            timestamp_text: time.into(),
            text: text.into(),
        })
        .collect()
}

pub fn sample_job(id: i64) -> ClipJob {
    ClipJob {
        id,
        source_url: "https://example/video".into(),
        start_seconds: 10.0,
        end_seconds: 25.0,
        transcript: sample_transcript(),
        crop_width: None,
        crop_height: None,
        aspect_ratio: None,
        current_artifact: Artifact::Unexported,
        created_at: None,
    }
}

pub fn stage_context(root: &Path, runner: FakeRunner) -> StageContext {
    let config = AppConfig::for_root(root);
    std::fs::create_dir_all(&config.output_dir).unwrap();
    std::fs::create_dir_all(&config.subtitles_dir).unwrap();
    StageContext::new(&config, Arc::new(runner))
}

pub fn write_valid_token(path: &Path) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    let expiry = (time::OffsetDateTime::now_utc().unix_timestamp() + 3600) * 1000;
    let cred = StoredCredential {
        access_token: "valid-token".into(),
        refresh_token: Some("rt".into()),
        scope: None,
        token_type: Some("Bearer".into()),
        expiry_date: Some(expiry),
    };
    std::fs::write(path, serde_json::to_vec(&cred).unwrap()).unwrap();
}

pub async fn test_state_with(root: &Path, runner: FakeRunner, publisher: FakePublisher) -> AppState {
    let config = AppConfig::for_root(root);
    std::fs::create_dir_all(&config.output_dir).unwrap();
    std::fs::create_dir_all(&config.subtitles_dir).unwrap();
    std::fs::create_dir_all(&config.data_dir).unwrap();

    let clips = ClipRepository::open(&config.ledger_file).await.unwrap();
    let credentials = CredentialManager::new(
        config.token_file.clone(),
        Some(Arc::new(FakeOAuth::default()) as Arc<dyn OAuthClient>),
    );
    AppState::new(config, clips, Arc::new(runner), credentials, Arc::new(publisher))
}

pub async fn test_state(root: &Path, runner: FakeRunner) -> AppState {
    test_state_with(root, runner, FakePublisher::default()).await
}

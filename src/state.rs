use std::sync::Arc;

use crate::config::settings::AppConfig;
use crate::infrastructure::google::VideoPublisher;
use crate::infrastructure::process::ToolRunner;
use crate::modules::auth::service::CredentialManager;
use crate::modules::clip::locks::JobLocks;
use crate::modules::clip::repository::ClipRepository;
use crate::modules::stages::StageContext;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub clips: Arc<ClipRepository>,
    pub locks: JobLocks,
    pub stages: StageContext,
    pub credentials: Arc<CredentialManager>,
    pub publisher: Arc<dyn VideoPublisher>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        clips: ClipRepository,
        runner: Arc<dyn ToolRunner>,
        credentials: CredentialManager,
        publisher: Arc<dyn VideoPublisher>,
    ) -> Self {
        Self {
            stages: StageContext::new(&config, runner),
            config,
            clips: Arc::new(clips),
            locks: JobLocks::default(),
            credentials: Arc::new(credentials),
            publisher,
        }
    }
}

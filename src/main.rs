use std::sync::Arc;

use anyhow::Context;
use dotenvy::dotenv;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod app;
mod common;
mod config;
mod docs;
mod infrastructure;
mod modules;
mod routes;
mod state;
#[cfg(test)]
mod testing;

use config::settings::AppConfig;
use infrastructure::google::{GoogleOAuthClient, OAuthClient, YouTubePublisher};
use infrastructure::process::ProcessInvoker;
use modules::auth::service::CredentialManager;
use modules::clip::repository::ClipRepository;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting server...");

    let config = AppConfig::new().context("invalid configuration")?;

    let ledger_dir = config.ledger_file.parent().map(|p| p.to_path_buf()).unwrap_or_default();
    for dir in [&config.data_dir, &ledger_dir, &config.output_dir, &config.subtitles_dir] {
        tokio::fs::create_dir_all(dir)
            .await
            .with_context(|| format!("failed to create {}", dir.display()))?;
    }

    for tool in [&config.ffmpeg_path, &config.ytdlp_path] {
        match which::which(tool) {
            Ok(path) => info!("Using {} at {}", tool, path.display()),
            Err(_) => warn!("{} not found in PATH; stages that need it will fail", tool),
        }
    }

    let clips = ClipRepository::open(&config.ledger_file)
        .await
        .with_context(|| format!("failed to load ledger {}", config.ledger_file.display()))?;

    let http = reqwest::Client::builder()
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("failed to build HTTP client")?;

    let oauth = config.google.clone().map(|google| {
        Arc::new(GoogleOAuthClient::new(http.clone(), google)) as Arc<dyn OAuthClient>
    });
    if oauth.is_none() {
        warn!("Google OAuth is not configured; publishing is disabled until it is");
    }
    let credentials = CredentialManager::new(config.token_file.clone(), oauth);
    let publisher = Arc::new(YouTubePublisher::new(http, config.youtube_upload_url.clone()));
    let runner = Arc::new(ProcessInvoker::new(config.tool_timeout));

    let port = config.server_port;
    let state = state::AppState::new(config, clips, runner, credentials, publisher);
    let app = app::create_app(state).await;

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server running on http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

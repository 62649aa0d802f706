use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::config::env::{self, EnvKey};
use crate::modules::subtitle::PrerollPolicy;

const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const DEFAULT_UPLOAD_URL: &str = "https://www.googleapis.com/upload/youtube/v3/videos";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
    #[error("failed to read client secret file {}: {reason}", path.display())]
    ClientSecretFile { path: PathBuf, reason: String },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub server_port: u16,
    pub data_dir: PathBuf,
    pub ledger_file: PathBuf,
    pub output_dir: PathBuf,
    pub subtitles_dir: PathBuf,
    pub ffmpeg_path: String,
    pub ytdlp_path: String,
    pub tool_timeout: Duration,
    pub font_file: Option<PathBuf>,
    pub subtitle_preroll: PrerollPolicy,
    pub token_file: PathBuf,
    pub youtube_upload_url: String,
    pub google: Option<GoogleOAuthConfig>,
}

/// OAuth client registration used for the publishing credential.
#[derive(Clone, Debug)]
pub struct GoogleOAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
}

#[derive(Deserialize)]
struct ClientSecretDocument {
    web: Option<ClientSecretEntry>,
    installed: Option<ClientSecretEntry>,
}

#[derive(Deserialize)]
struct ClientSecretEntry {
    client_id: String,
    client_secret: String,
    #[serde(default)]
    redirect_uris: Vec<String>,
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        let data_dir = PathBuf::from(env::get_or(EnvKey::DataDir, "data"));
        let output_dir = PathBuf::from(env::get_or(EnvKey::OutputDir, "public"));

        let ledger_file = env::get_opt(EnvKey::LedgerFile)
            .map(PathBuf::from)
            .unwrap_or_else(|| data_dir.join("clip_jobs.json"));
        let subtitles_dir = env::get_opt(EnvKey::SubtitlesDir)
            .map(PathBuf::from)
            .unwrap_or_else(|| output_dir.join("subtitles"));

        let preroll_raw = env::get_or(EnvKey::SubtitlePreroll, "retain");
        let subtitle_preroll = preroll_raw.parse().map_err(|_| ConfigError::Invalid {
            key: EnvKey::SubtitlePreroll.as_str(),
            value: preroll_raw.clone(),
        })?;

        Ok(Self {
            server_port: env::get_parsed(EnvKey::ServerPort, 8080),
            data_dir,
            ledger_file,
            output_dir,
            subtitles_dir,
            ffmpeg_path: env::get_or(EnvKey::FfmpegPath, "ffmpeg"),
            ytdlp_path: env::get_or(EnvKey::YtDlpPath, "yt-dlp"),
            tool_timeout: Duration::from_secs(env::get_parsed(EnvKey::ToolTimeoutSecs, 1800)),
            font_file: env::get_opt(EnvKey::FontFile).map(PathBuf::from),
            subtitle_preroll,
            token_file: PathBuf::from(env::get_or(EnvKey::TokenFile, "credentials/tokens.json")),
            youtube_upload_url: env::get_or(EnvKey::YoutubeUploadUrl, DEFAULT_UPLOAD_URL),
            google: Self::load_google()?,
        })
    }

    /// Explicit env vars win; otherwise fall back to the downloaded client secret document.
    fn load_google() -> Result<Option<GoogleOAuthConfig>, ConfigError> {
        let auth_url = env::get_or(EnvKey::GoogleAuthUrl, DEFAULT_AUTH_URL);
        let token_url = env::get_or(EnvKey::GoogleTokenUrl, DEFAULT_TOKEN_URL);

        if let (Some(client_id), Some(client_secret), Some(redirect_uri)) = (
            env::get_opt(EnvKey::GoogleClientId),
            env::get_opt(EnvKey::GoogleClientSecret),
            env::get_opt(EnvKey::GoogleRedirectUri),
        ) {
            return Ok(Some(GoogleOAuthConfig {
                client_id,
                client_secret,
                redirect_uri,
                auth_url,
                token_url,
            }));
        }

        let Some(path) = env::get_opt(EnvKey::GoogleClientSecretFile) else {
            return Ok(None);
        };
        let entry = read_client_secret(Path::new(&path)).map_err(|e| {
            ConfigError::ClientSecretFile {
                path: PathBuf::from(&path),
                reason: format!("{:#}", e),
            }
        })?;
        let redirect_uri = entry
            .redirect_uris
            .into_iter()
            .next()
            .ok_or_else(|| ConfigError::Invalid {
                key: EnvKey::GoogleClientSecretFile.as_str(),
                value: "no redirect_uris entry".to_string(),
            })?;

        Ok(Some(GoogleOAuthConfig {
            client_id: entry.client_id,
            client_secret: entry.client_secret,
            redirect_uri,
            auth_url,
            token_url,
        }))
    }

    /// Config rooted in a scratch directory, used by tests.
    #[cfg(test)]
    pub fn for_root(root: &Path) -> Self {
        Self {
            server_port: 0,
            data_dir: root.join("data"),
            ledger_file: root.join("data").join("clip_jobs.json"),
            output_dir: root.join("public"),
            subtitles_dir: root.join("public").join("subtitles"),
            ffmpeg_path: "ffmpeg".to_string(),
            ytdlp_path: "yt-dlp".to_string(),
            tool_timeout: Duration::from_secs(30),
            font_file: None,
            subtitle_preroll: PrerollPolicy::Retain,
            token_file: root.join("credentials").join("tokens.json"),
            youtube_upload_url: DEFAULT_UPLOAD_URL.to_string(),
            google: None,
        }
    }
}

fn read_client_secret(path: &Path) -> anyhow::Result<ClientSecretEntry> {
    let raw = std::fs::read_to_string(path)?;
    let doc: ClientSecretDocument = serde_json::from_str(&raw)?;
    doc.web
        .or(doc.installed)
        .ok_or_else(|| anyhow::anyhow!("expected a \"web\" or \"installed\" entry"))
}

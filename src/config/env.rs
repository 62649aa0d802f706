use std::env;
use std::str::FromStr;

pub enum EnvKey {
    ServerPort,
    DataDir,
    LedgerFile,
    OutputDir,
    SubtitlesDir,
    FfmpegPath,
    YtDlpPath,
    ToolTimeoutSecs,
    FontFile,
    SubtitlePreroll,
    GoogleClientId,
    GoogleClientSecret,
    GoogleRedirectUri,
    GoogleClientSecretFile,
    TokenFile,
    GoogleAuthUrl,
    GoogleTokenUrl,
    YoutubeUploadUrl,
}

impl EnvKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvKey::ServerPort => "APP_PORT",
            EnvKey::DataDir => "DATA_DIR",
            EnvKey::LedgerFile => "LEDGER_FILE",
            EnvKey::OutputDir => "OUTPUT_DIR",
            EnvKey::SubtitlesDir => "SUBTITLES_DIR",
            EnvKey::FfmpegPath => "FFMPEG_PATH",
            EnvKey::YtDlpPath => "YTDLP_PATH",
            EnvKey::ToolTimeoutSecs => "TOOL_TIMEOUT_SECS",
            EnvKey::FontFile => "FONT_FILE",
            EnvKey::SubtitlePreroll => "SUBTITLE_PREROLL",
            EnvKey::GoogleClientId => "GOOGLE_CLIENT_ID",
            EnvKey::GoogleClientSecret => "GOOGLE_CLIENT_SECRET",
            EnvKey::GoogleRedirectUri => "GOOGLE_REDIRECT_URI",
            EnvKey::GoogleClientSecretFile => "GOOGLE_CLIENT_SECRET_FILE",
            EnvKey::TokenFile => "TOKEN_FILE",
            EnvKey::GoogleAuthUrl => "GOOGLE_AUTH_URL",
            EnvKey::GoogleTokenUrl => "GOOGLE_TOKEN_URL",
            EnvKey::YoutubeUploadUrl => "YOUTUBE_UPLOAD_URL",
        }
    }
}

pub fn get(key: EnvKey) -> Result<String, env::VarError> {
    env::var(key.as_str())
}

pub fn get_opt(key: EnvKey) -> Option<String> {
    env::var(key.as_str()).ok().filter(|v| !v.trim().is_empty())
}

pub fn get_or(key: EnvKey, default: &str) -> String {
    env::var(key.as_str()).unwrap_or_else(|_| default.to_string())
}

pub fn get_parsed<T: FromStr>(key: EnvKey, default: T) -> T {
    match get(key) {
        Ok(val) => val.parse::<T>().unwrap_or(default),
        Err(_) => default,
    }
}

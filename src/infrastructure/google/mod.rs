pub mod oauth;
pub mod youtube;

pub use oauth::{GoogleOAuthClient, OAuthClient, TokenGrant};
pub use youtube::{VideoMetadata, VideoPublisher, YouTubePublisher};

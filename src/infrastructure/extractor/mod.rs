pub mod ytdlp;

pub use ytdlp::StreamResolver;

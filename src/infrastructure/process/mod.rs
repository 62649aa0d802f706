pub mod ffmpeg;
pub mod invoker;

pub use ffmpeg::{FfmpegCommand, FfmpegInput};
pub use invoker::{ProcessInvoker, ToolInvocation, ToolRunner};

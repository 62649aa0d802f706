pub mod compiler;

pub use compiler::{PrerollPolicy, SubtitleDocument, compile};

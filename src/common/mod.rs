pub mod color;
pub mod error;
pub mod fs;
pub mod response;
pub mod timecode;

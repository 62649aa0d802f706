pub mod extractor;
pub mod google;
pub mod process;

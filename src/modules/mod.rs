pub mod auth;
pub mod clip;
pub mod publish;
pub mod stages;
pub mod subtitle;

//! Command implementations.

pub mod app;
pub mod auth;
pub mod completions;
pub mod daemon;
pub mod favorites;
pub mod history;
pub mod init;
pub mod queue;
pub mod status;
pub mod sync;
pub mod version;

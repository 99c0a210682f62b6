//! Client errors.

use bubbles_core::config::ConfigError;
use bubbles_core::engine::EngineError;
use bubbles_render::FrameError;
use thiserror::Error;

/// Errors surfaced by the canvas controller and the headless runner.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Session failed to start: {0}")]
    Startup(#[from] EngineError),
    #[error("Session has ended")]
    SessionEnded,
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Frame skipped: {0}")]
    Frame(#[from] FrameError),
}

/// Result type for client operations.
pub type ClientResult<T> = Result<T, ClientError>;

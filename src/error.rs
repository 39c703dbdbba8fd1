//! Error types for preview-deck
//!
//! Defines module-specific error types using thiserror for clear error propagation.

use thiserror::Error;

/// Main error type for preview-deck
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration file loading errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A control's slug did not resolve to any registered track
    #[error("Track not found: {0}")]
    TrackNotFound(String),

    /// The playback-start operation was rejected by the media handle
    #[error("Playback start failed for '{0}': {1}")]
    PlaybackStart(String, String),

    /// Invalid state for operation
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// File I/O errors
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience Result type using preview-deck Error
pub type Result<T> = std::result::Result<T, Error>;

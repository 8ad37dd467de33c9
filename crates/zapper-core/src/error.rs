//! Error types for Zapper Core

use thiserror::Error;

/// Result type alias for player operations
pub type Result<T> = std::result::Result<T, Error>;

/// Player error types
#[derive(Error, Debug)]
pub enum Error {
    // Resolution errors
    #[error("Stream discovery failed: {0}")]
    Discovery(String),

    #[error("Access token fetch failed: {0}")]
    TokenFetch(String),

    #[error("Stream link fetch failed: {0}")]
    LinkFetch(String),

    #[error("No stream entry found in playlist")]
    NoStreamEntry,

    // Playback errors
    #[error("Playback error: {0}")]
    Playback(String),

    #[error("Invalid playback state transition: {from} -> {to}")]
    InvalidStateTransition { from: String, to: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Error::Playback(msg.into())
    }

    /// Returns true if this error is recoverable by retrying the
    /// resolution stage that produced it
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::Discovery(_)
                | Error::TokenFetch(_)
                | Error::LinkFetch(_)
                | Error::NoStreamEntry
        )
    }

    /// Returns the error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Discovery(_) => "DISCOVERY",
            Error::TokenFetch(_) => "TOKEN_FETCH",
            Error::LinkFetch(_) => "LINK_FETCH",
            Error::NoStreamEntry => "NO_STREAM_ENTRY",
            Error::Playback(_) => "PLAYBACK",
            Error::InvalidStateTransition { .. } => "INVALID_STATE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

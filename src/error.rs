//! Error taxonomy for the session components

use thiserror::Error;

/// Message shown to the user whenever a network-facing operation fails.
pub const APOLOGY_MESSAGE: &str = "We couldn't retrieve the music data. Please try again.";

#[derive(Error, Debug)]
pub enum SessionError {
    /// The credential exchange was rejected
    #[error("failed to fetch token: {reason}")]
    Auth { reason: String },

    /// An operation that needs a credential ran before one was acquired
    #[error("no credential available")]
    NoCredential,

    #[error("failed to fetch music data: {status_text}")]
    Search { status_text: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("playback engine error: {0}")]
    Engine(String),
}

pub type Result<T, E = SessionError> = std::result::Result<T, E>;

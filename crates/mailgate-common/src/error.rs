//! Error types for Mailgate

use thiserror::Error;

/// Main error type for Mailgate
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Mailbox select error: {0}")]
    Select(String),

    #[error("Search error: {0}")]
    Search(String),

    /// Per-message fetch failure. Never fatal to a retrieval operation:
    /// the orchestrator logs it and skips the message.
    #[error("Fetch error for message {id}: {reason}")]
    Fetch { id: String, reason: String },

    #[error("SMTP error: {0}")]
    Smtp(String),

    #[error("Unsupported SMTP port: {0} (expected 465 or 587)")]
    UnsupportedPort(u16),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for Mailgate
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        match self {
            Error::Config(_) => 500,
            Error::Connection(_) => 500,
            Error::Auth(_) => 401,
            Error::Select(_) => 500,
            Error::Search(_) => 500,
            Error::Fetch { .. } => 500,
            Error::Smtp(_) => 500,
            Error::UnsupportedPort(_) => 400,
            Error::Validation(_) => 422,
            Error::Internal(_) => 500,
            Error::Other(_) => 500,
        }
    }

    /// Returns the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Error::Config(_) => "CONFIG_ERROR",
            Error::Connection(_) => "CONNECTION_ERROR",
            Error::Auth(_) => "UNAUTHORIZED",
            Error::Select(_) => "SELECT_ERROR",
            Error::Search(_) => "SEARCH_ERROR",
            Error::Fetch { .. } => "FETCH_ERROR",
            Error::Smtp(_) => "SMTP_ERROR",
            Error::UnsupportedPort(_) => "UNSUPPORTED_PORT",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Internal(_) => "INTERNAL_ERROR",
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }
}

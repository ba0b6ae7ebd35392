//! Error handling for the Resolution client

use std::fmt;
use thiserror::Error;

/// Unified error type for the Resolution client
///
/// The variants that carry a user-facing message (`Api`, `Validation`,
/// `Domain`, `Auth`, `NotFound`) display the bare message, so callers can
/// render them inline next to the form that triggered them.
#[derive(Error, Debug)]
pub enum Error {
    /// Transport failure: the request produced no response at all
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response from the backend
    #[error("{message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Server-supplied `error`/`detail`, or a generic status line
        message: String,
    },

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Session store I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Client-side validation failure, raised before any network call
    #[error("{0}")]
    Validation(String),

    /// Logical failure reported inside a 2xx payload (`{success: false, error}`)
    #[error("{0}")]
    Domain(String),

    /// Missing session, unverified account or insufficient role
    #[error("{0}")]
    Auth(String),

    /// A looked-up entity does not exist
    #[error("{0}")]
    NotFound(String),

    /// The response body did not have the expected shape
    #[error("Unexpected response body: {0}")]
    UnexpectedBody(String),

    /// General errors
    #[error("{0}")]
    General(String),
}

impl Error {
    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new domain error
    pub fn domain<T: fmt::Display>(msg: T) -> Self {
        Error::Domain(msg.to_string())
    }

    /// Create a new authentication error
    pub fn auth<T: fmt::Display>(msg: T) -> Self {
        Error::Auth(msg.to_string())
    }

    /// Create a new not-found error
    pub fn not_found<T: fmt::Display>(msg: T) -> Self {
        Error::NotFound(msg.to_string())
    }

    /// Create a new unexpected-body error
    pub fn unexpected_body<T: fmt::Display>(msg: T) -> Self {
        Error::UnexpectedBody(msg.to_string())
    }

    /// Create a new general error
    pub fn general<T: fmt::Display>(msg: T) -> Self {
        Error::General(msg.to_string())
    }

    /// HTTP status of an `Api` error
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

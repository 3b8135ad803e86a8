//! Centralized error types for mailembed.

use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the mailembed library.
///
/// Header normalization, node matching, classification and identifier
/// generation never fail; only message loading and blob fetching do.
#[derive(Error, Debug)]
pub enum EmbedError {
    /// I/O error with the associated file path.
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The specified file does not exist.
    #[error("Message file not found: {0}")]
    FileNotFound(PathBuf),

    /// A MIME decoding error.
    #[error("MIME decoding error: {0}")]
    MimeError(String),

    /// The blob server answered with something other than 200.
    ///
    /// `body` is the raw response payload, handed back untouched.
    #[error("Fetching '{url}' failed with status {status} ({} byte body)", .body.len())]
    FetchStatus {
        url: String,
        status: u16,
        body: Vec<u8>,
    },

    /// The request never produced a response.
    #[error("Transport error fetching '{url}': {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    /// The configuration contains a value we cannot use.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for `Result<T, EmbedError>`.
pub type Result<T> = std::result::Result<T, EmbedError>;

impl EmbedError {
    /// Create an `Io` variant from a path and an `io::Error`.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Raw response body of a failed fetch, if this is one.
    pub fn response_body(&self) -> Option<&[u8]> {
        match self {
            Self::FetchStatus { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// Allow `?` on `std::io::Error` when no path context is available
/// (prefer `EmbedError::io`).
impl From<std::io::Error> for EmbedError {
    fn from(source: std::io::Error) -> Self {
        Self::Io {
            path: PathBuf::from("<unknown>"),
            source,
        }
    }
}

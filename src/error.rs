//! Error types
//!
//! `RelayError` covers the datagram path (transport, decoding, store).
//! `RequestError` covers the HTTP side of a contact submission and maps
//! onto a 4xx status.

use hyper::StatusCode;
use std::path::PathBuf;
use thiserror::Error;

/// Result alias for relay and store operations
pub type Result<T, E = RelayError> = std::result::Result<T, E>;

/// Errors raised between the relay socket and the merge store
#[derive(Error, Debug)]
pub enum RelayError {
    /// Datagram send, bind or receive failed
    #[error("transport error while {context}: {source}")]
    Transport {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Payload could not be decoded into field/value pairs
    #[error("malformed submission: {reason}")]
    MalformedSubmission { reason: String },

    /// Store file could not be read or written
    #[error("store I/O error on {}: {source}", path.display())]
    StoreIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Store file exists but does not hold a JSON object
    #[error("store file {} is corrupt: {reason}", path.display())]
    StoreCorrupt { path: PathBuf, reason: String },

    /// Record or document could not be encoded for writing
    #[error("could not encode {what} for {}: {source}", path.display())]
    StoreEncode {
        path: PathBuf,
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl RelayError {
    pub fn transport(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Transport {
            context: context.into(),
            source,
        }
    }

    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedSubmission {
            reason: reason.into(),
        }
    }

    pub const fn is_store_error(&self) -> bool {
        matches!(
            self,
            Self::StoreIo { .. } | Self::StoreCorrupt { .. } | Self::StoreEncode { .. }
        )
    }
}

/// Errors that reject a single contact POST before anything is relayed
#[derive(Error, Debug, PartialEq, Eq)]
pub enum RequestError {
    #[error("Content-Length header is required")]
    MissingContentLength,

    #[error("invalid Content-Length value '{0}'")]
    InvalidContentLength(String),

    #[error("request body too large: {size} bytes (max: {max})")]
    BodyTooLarge { size: u64, max: u64 },

    #[error("failed to read request body: {0}")]
    BodyRead(String),
}

impl RequestError {
    /// HTTP status returned to the client for this rejection
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::MissingContentLength => StatusCode::LENGTH_REQUIRED,
            Self::InvalidContentLength(_) | Self::BodyRead(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge { .. } => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }
}

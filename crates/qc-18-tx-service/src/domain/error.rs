//! Transaction service error types.
//!
//! Every facade failure carries a stable classification ([`Code`]) and a
//! human-readable message. Errors coming back from collaborators that this
//! layer has no specific knowledge about are kept as [`UpstreamError`] and
//! forwarded verbatim.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Numeric status codes on the wire (gRPC numbering).
pub mod codes {
    pub const UNKNOWN: u32 = 2;
    pub const INVALID_ARGUMENT: u32 = 3;
    pub const NOT_FOUND: u32 = 5;
    pub const UNIMPLEMENTED: u32 = 12;
    pub const INTERNAL: u32 = 13;
}

/// Stable error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Code {
    /// Malformed or missing request field. Never retried.
    InvalidArgument,
    /// The requested transaction is not indexed.
    NotFound,
    /// A codec/registration invariant was violated.
    Internal,
    /// Deliberate placeholder.
    Unimplemented,
    /// Execution failed for a reason not otherwise classified.
    Unknown,
}

impl Code {
    /// Wire status code.
    pub fn as_u32(self) -> u32 {
        match self {
            Code::InvalidArgument => codes::INVALID_ARGUMENT,
            Code::NotFound => codes::NOT_FOUND,
            Code::Internal => codes::INTERNAL,
            Code::Unimplemented => codes::UNIMPLEMENTED,
            Code::Unknown => codes::UNKNOWN,
        }
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Code::InvalidArgument => "InvalidArgument",
            Code::NotFound => "NotFound",
            Code::Internal => "Internal",
            Code::Unimplemented => "Unimplemented",
            Code::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Opaque error reported by the tx index, the execution engine or the
/// broadcast transport.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub message: String,
}

impl UpstreamError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Whether the message text reports a missing entry.
    pub fn is_not_found(&self) -> bool {
        self.message.contains("not found")
    }
}

/// Errors returned by the transaction service facade.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),

    #[error("{0}")]
    Unimplemented(String),

    #[error("{0}")]
    Unknown(String),

    /// Collaborator error forwarded unchanged.
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

impl TxServiceError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    pub fn unimplemented(message: impl Into<String>) -> Self {
        Self::Unimplemented(message.into())
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown(message.into())
    }

    /// Classification, or `None` for a pass-through collaborator error.
    pub fn code(&self) -> Option<Code> {
        match self {
            Self::InvalidArgument(_) => Some(Code::InvalidArgument),
            Self::NotFound(_) => Some(Code::NotFound),
            Self::Internal(_) => Some(Code::Internal),
            Self::Unimplemented(_) => Some(Code::Unimplemented),
            Self::Unknown(_) => Some(Code::Unknown),
            Self::Upstream(_) => None,
        }
    }

    /// Wire error object.
    ///
    /// Pass-through errors are reported with the `Unknown` status code, the
    /// same way an RPC server reports an unclassified handler error.
    pub fn to_payload(&self) -> ErrorPayload {
        ErrorPayload {
            code: self.code().unwrap_or(Code::Unknown).as_u32(),
            message: self.to_string(),
        }
    }
}

/// Serialisable error object for the RPC boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: u32,
    pub message: String,
}

/// Result type for facade operations.
pub type TxServiceResult<T> = Result<T, TxServiceError>;

//! Domain error types

use thiserror::Error;

/// Domain-level errors that can occur during validation or decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A header name is invalid.
    #[error("invalid header name: {0}")]
    InvalidHeaderName(String),

    /// A header value is invalid.
    #[error("invalid header value: {0}")]
    InvalidHeaderValue(String),

    /// A token could not be decoded.
    #[error("malformed token: {0}")]
    MalformedToken(String),

    /// An application status string is not recognised.
    #[error("unknown application status: {0}")]
    UnknownStatus(String),
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

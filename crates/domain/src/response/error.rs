//! Normalized request failure.
//!
//! Every failure leaving the request client is a [`ResponseError`]:
//! callers never see raw transport errors.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Message used when no server-provided message is available.
pub const UNKNOWN_NETWORK_ERROR: &str = "unknown network error";

/// Classification of a failed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProblemKind {
    /// The server answered with a 4xx status.
    ClientError,
    /// The server answered with a 5xx status.
    ServerError,
    /// No response was received (connection, DNS, timeout).
    NetworkError,
    /// Anything that does not fit the other classes.
    UnknownError,
}

impl ProblemKind {
    /// Classifies a failure by the status of the last attempt.
    ///
    /// `None` means the request never produced a response.
    #[must_use]
    pub const fn from_status(status: Option<u16>) -> Self {
        match status {
            None => Self::NetworkError,
            Some(400..=499) => Self::ClientError,
            Some(500..=599) => Self::ServerError,
            Some(_) => Self::UnknownError,
        }
    }

    /// Returns the canonical identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ClientError => "CLIENT_ERROR",
            Self::ServerError => "SERVER_ERROR",
            Self::NetworkError => "NETWORK_ERROR",
            Self::UnknownError => "UNKNOWN_ERROR",
        }
    }
}

impl fmt::Display for ProblemKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Canonical error produced by the request client.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message} ({problem})")]
pub struct ResponseError {
    /// Server-provided `errorMessage`, or [`UNKNOWN_NETWORK_ERROR`].
    pub message: String,
    /// HTTP status of the last attempt, if any response arrived.
    pub status: Option<u16>,
    /// Failure class.
    pub problem: ProblemKind,
}

impl ResponseError {
    /// Creates a new error from its parts.
    #[must_use]
    pub fn new(message: impl Into<String>, status: Option<u16>, problem: ProblemKind) -> Self {
        Self {
            message: message.into(),
            status,
            problem,
        }
    }

    /// Builds an error for a response with the given status.
    ///
    /// The problem class follows the status; the message falls back to
    /// [`UNKNOWN_NETWORK_ERROR`] when the server did not provide one.
    #[must_use]
    pub fn from_response(status: u16, message: Option<String>) -> Self {
        Self {
            message: message.unwrap_or_else(|| UNKNOWN_NETWORK_ERROR.to_string()),
            status: Some(status),
            problem: ProblemKind::from_status(Some(status)),
        }
    }

    /// Builds an error for a request that never got a response.
    #[must_use]
    pub fn network() -> Self {
        Self {
            message: UNKNOWN_NETWORK_ERROR.to_string(),
            status: None,
            problem: ProblemKind::NetworkError,
        }
    }
}

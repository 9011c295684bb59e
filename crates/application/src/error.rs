//! Application error types

use thiserror::Error;
use tether_domain::{DomainError, ResponseError};

use crate::ports::{IdentityError, StorageError};

/// Errors raised by a step of an auth flow.
///
/// Flows never let these escape: each one is turned into the flow's
/// failure event and a [`tether_domain::FlowOutcome::Failed`].
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// A domain validation error occurred.
    #[error("domain error: {0}")]
    Domain(#[from] DomainError),

    /// The identity provider rejected or could not complete a call.
    #[error("identity provider error: {0}")]
    Identity(#[from] IdentityError),

    /// The token store or state persistence failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// A call through the request client failed.
    #[error("request failed: {0}")]
    Request(#[from] ResponseError),
}

/// Result type alias for application operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;

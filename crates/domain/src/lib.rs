//! Tether Domain - Core session types
//!
//! This crate defines the domain model for the Tether session layer.
//! All types here are pure Rust with no I/O dependencies.

pub mod auth;
pub mod error;
pub mod id;
pub mod request;
pub mod response;
pub mod state;

pub use auth::{
    ANONYMOUS_CUSTOMER_ID, AuthEvent, AuthorizeOptions, CancelReason, DEFAULT_CONNECTION,
    ExpiryPolicy, FlowOutcome, LOGIN_SCOPE, REFRESH_CALL_FAILED, REFRESH_SCOPE,
    REFRESH_UNAUTHORIZED, RefreshPlan, TokenSet, UserDetails,
};
pub use error::{DomainError, DomainResult};
pub use id::generate_device_id;
pub use request::HttpMethod;
pub use response::{ProblemKind, ResponseError, UNKNOWN_NETWORK_ERROR};
pub use state::{AppStatus, AuthState, PersistenceState};

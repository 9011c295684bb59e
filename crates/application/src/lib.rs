//! Tether Application - Use cases and ports
//!
//! This crate contains the session logic of Tether:
//! - Ports (traits) for the identity provider, token storage, the request
//!   client and the fire-and-forget observers
//! - The application store reduced from auth events
//! - The login, logout and refresh flows and the supervisors running them

pub mod auth;
pub mod error;
pub mod persistence;
pub mod ports;
pub mod store;

#[cfg(test)]
mod testing;

pub use auth::{
    AuthCommand, AuthCommands, AuthOrchestrator, AuthServices, RehydrationDecision,
    StatusReporter, Supervisors, rehydrate_session,
};
pub use error::{ApplicationError, ApplicationResult};
pub use persistence::{restore, spawn_persister};
pub use store::AppStore;

//! Session lifecycle: the auth flows, rehydration and the supervisors
//! that run them.

mod orchestrator;
mod rehydration;
mod supervisor;

pub use orchestrator::{AuthOrchestrator, AuthServices};
pub use rehydration::{RehydrationDecision, rehydrate_session};
pub use supervisor::{AuthCommand, AuthCommands, StatusReporter, Supervisors};

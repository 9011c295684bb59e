//! Identity provider adapters.

mod agent;
mod oidc_provider;
mod pkce;

pub use agent::{AuthorizationAgent, LoopbackAgent};
pub use oidc_provider::{OidcIdentityProvider, OidcSettings};

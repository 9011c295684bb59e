//! Port definitions (interfaces)
//!
//! Ports define the boundaries between the application core and external systems.
//! Each port is a trait that can be implemented by adapters in the infrastructure layer.

mod api_credentials;
mod clock;
mod customer_profile;
mod identity_provider;
mod observers;
mod session_persistence;
mod token_store;

pub use api_credentials::ApiCredentials;
pub use clock::Clock;
pub use customer_profile::CustomerProfile;
pub use identity_provider::{IdentityError, IdentityProvider};
pub use observers::{Analytics, CustomerIdentity, OrderManagement};
pub use session_persistence::SessionPersistence;
pub use token_store::{StorageError, TokenStore};

//! Tether Infrastructure - Adapters and implementations
//!
//! This crate provides concrete implementations of the ports
//! defined in the application layer: the resilient request client, the
//! OIDC identity provider, file-backed storage and the observers.

pub mod adapters;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod persistence;
pub mod serialization;

pub use adapters::{
    ChannelOrderManagement, HttpCustomerProfile, OrderCommand, SystemClock, TracingAnalytics,
};
pub use auth::{AuthorizationAgent, LoopbackAgent, OidcIdentityProvider, OidcSettings};
pub use config::AppConfig;
pub use error::{InfrastructureError, InfrastructureResult};
pub use http::{ApiClient, RequestOptions, RetryPolicy};
pub use persistence::{
    FileSessionPersistence, FileTokenStore, JsonFile, load_or_create_device_id,
};
pub use serialization::{SerializationError, from_json_bytes, to_json_stable_bytes};

//! Errors raised while setting up adapters.
//!
//! Runtime failures of the adapters are reported through the error types
//! of the ports they implement; these only cover construction.

use tether_application::ports::StorageError;
use thiserror::Error;

/// Adapter setup failure.
#[derive(Debug, Error)]
pub enum InfrastructureError {
    /// Configuration could not be loaded or did not match the schema.
    #[error("configuration error: {0}")]
    Config(#[from] ::config::ConfigError),

    /// The HTTP client could not be built.
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// A configured URL is not valid.
    #[error("invalid URL {url}: {message}")]
    InvalidUrl {
        /// The offending value
        url: String,
        /// Parser error
        message: String,
    },

    /// No storage directory configured and no platform default exists.
    #[error("no data directory available, set storage.dir")]
    NoDataDir,

    /// On-disk state could not be read or written.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type alias for adapter setup.
pub type InfrastructureResult<T> = Result<T, InfrastructureError>;

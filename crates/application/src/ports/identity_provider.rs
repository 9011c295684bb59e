//! Identity provider port.

use async_trait::async_trait;
use tether_domain::{AuthorizeOptions, TokenSet};

/// Identity provider failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum IdentityError {
    /// The user aborted the interactive authorization.
    #[error("authorization cancelled by user")]
    UserCancelled,

    /// The provider refused the authorization or token exchange.
    #[error("authorization rejected: {message}")]
    Rejected {
        /// Provider error description.
        message: String,
    },

    /// The redirect did not carry the expected parameters.
    #[error("invalid authorization callback: {message}")]
    InvalidCallback {
        /// Error description.
        message: String,
    },

    /// The provider could not be reached or answered garbage.
    #[error("network error: {message}")]
    Network {
        /// Error description.
        message: String,
    },
}

/// External service issuing and renewing session credentials.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Runs the interactive authorization and returns fresh credentials.
    ///
    /// # Errors
    /// Returns an error if the user cancels or the provider fails.
    async fn authorize(&self, options: &AuthorizeOptions) -> Result<TokenSet, IdentityError>;

    /// Silently exchanges a refresh token for new credentials.
    ///
    /// # Errors
    /// Returns an error if the refresh token is rejected or the provider fails.
    async fn refresh_token(
        &self,
        refresh_token: &str,
        scope: &str,
    ) -> Result<TokenSet, IdentityError>;
}

//! Customer profile port.

use async_trait::async_trait;
use tether_domain::{ResponseError, UserDetails};

/// Looks up the profile of the customer owning the registered credential.
#[async_trait]
pub trait CustomerProfile: Send + Sync {
    /// Fetches the current customer's profile.
    ///
    /// # Errors
    /// Returns the request client's error when the lookup fails.
    async fn get_customer_info(&self) -> Result<UserDetails, ResponseError>;
}

//! Customer profile lookup over the request client.

use async_trait::async_trait;
use tether_application::ports::CustomerProfile;
use tether_domain::{ProblemKind, ResponseError, UserDetails};

use crate::http::{ApiClient, RequestOptions};

/// Default profile endpoint.
pub const DEFAULT_PROFILE_PATH: &str = "/customers/me";

/// Fetches the profile of the customer owning the registered credential.
#[derive(Debug, Clone)]
pub struct HttpCustomerProfile {
    client: ApiClient,
    path: String,
}

impl HttpCustomerProfile {
    /// Creates a lookup against `path` on `client`.
    #[must_use]
    pub fn new(client: ApiClient, path: impl Into<String>) -> Self {
        Self {
            client,
            path: path.into(),
        }
    }
}

fn unexpected_payload(message: &str) -> ResponseError {
    ResponseError::new(message, None, ProblemKind::UnknownError)
}

#[async_trait]
impl CustomerProfile for HttpCustomerProfile {
    async fn get_customer_info(&self) -> Result<UserDetails, ResponseError> {
        let body = self.client.get(&self.path, &RequestOptions::new()).await?;
        let user: UserDetails = serde_json::from_value(body)
            .map_err(|e| unexpected_payload(&format!("unexpected profile payload: {e}")))?;
        if user.customer_id.trim().is_empty() {
            return Err(unexpected_payload("profile has no customer id"));
        }
        Ok(user)
    }
}

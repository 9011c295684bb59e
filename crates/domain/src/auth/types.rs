//! Session credential and user types

use serde::{Deserialize, Serialize};

/// Scope requested by the interactive login.
pub const LOGIN_SCOPE: &str = "openid offline_access email profile";

/// Scope requested when silently refreshing a session.
pub const REFRESH_SCOPE: &str = "openid offline_access profile email";

/// Identity-provider connection used for the interactive login.
pub const DEFAULT_CONNECTION: &str = "firebase-auth";

/// Identifier reported to analytics when no customer is known.
pub const ANONYMOUS_CUSTOMER_ID: &str = "anonymous";

/// Credentials representing one authenticated session.
///
/// Replaced wholesale on refresh and destroyed on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    /// Access token issued by the identity provider.
    #[serde(default)]
    pub access_token: String,
    /// Id token, registered as the API credential.
    pub id_token: String,
    /// Refresh token used for silent renewal.
    #[serde(default)]
    pub refresh_token: Option<String>,
}

impl TokenSet {
    /// Creates a complete token set.
    #[must_use]
    pub fn new(
        access_token: impl Into<String>,
        id_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        Self {
            access_token: access_token.into(),
            id_token: id_token.into(),
            refresh_token: Some(refresh_token.into()),
        }
    }

    /// Returns the refresh token, treating an empty string as absent.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref().filter(|t| !t.is_empty())
    }

    /// Returns the id token, treating an empty string as absent.
    #[must_use]
    pub fn id_token(&self) -> Option<&str> {
        Some(self.id_token.as_str()).filter(|t| !t.is_empty())
    }
}

/// Options for the interactive authorization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeOptions {
    /// Space-separated scopes.
    pub scope: String,
    /// Identity-provider connection name.
    pub connection: String,
    /// Do not share browser session state with other logins.
    pub ephemeral_session: bool,
}

impl AuthorizeOptions {
    /// Options used by the login flow.
    #[must_use]
    pub fn login() -> Self {
        Self {
            scope: LOGIN_SCOPE.to_string(),
            connection: DEFAULT_CONNECTION.to_string(),
            ephemeral_session: true,
        }
    }

    /// Overrides the connection name.
    #[must_use]
    pub fn with_connection(mut self, connection: impl Into<String>) -> Self {
        self.connection = connection.into();
        self
    }
}

impl Default for AuthorizeOptions {
    fn default() -> Self {
        Self::login()
    }
}

/// Customer profile returned by the profile service.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDetails {
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Contact email
    #[serde(default)]
    pub email: String,
    /// Birth date as provided by the profile service
    #[serde(default)]
    pub birth_date: Option<String>,
    /// Phone numbers, shape owned by the profile service
    #[serde(default)]
    pub phones: serde_json::Value,
    /// Customer preferences, shape owned by the profile service
    #[serde(default)]
    pub preferences: serde_json::Value,
    /// Stable customer identifier; a profile without one is rejected.
    pub customer_id: String,
}

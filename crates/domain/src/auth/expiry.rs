//! Token expiry policy.
//!
//! Decides from the id token alone whether a session must be renewed.
//! Any token that cannot be decoded is treated as expired so the caller
//! falls back to re-authentication.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;

use super::TokenSet;
use crate::error::{DomainError, DomainResult};

/// Seconds before expiry at which a token is already considered stale.
pub const DEFAULT_REFRESH_MARGIN_SECONDS: i64 = 60;

#[derive(Debug, Deserialize)]
struct Claims {
    exp: Option<i64>,
}

/// Reads the `exp` claim of a JWT.
///
/// The signature is not verified; the token came from our own store.
///
/// # Errors
///
/// Returns [`DomainError::MalformedToken`] if the token is not three
/// dot-separated segments, the payload is not base64url JSON, or the
/// `exp` claim is missing or out of range.
pub fn token_expiry(token: &str) -> DomainResult<DateTime<Utc>> {
    let mut segments = token.split('.');
    let (Some(_header), Some(payload), Some(_signature), None) = (
        segments.next(),
        segments.next(),
        segments.next(),
        segments.next(),
    ) else {
        return Err(DomainError::MalformedToken(
            "expected three segments".to_string(),
        ));
    };

    let bytes = URL_SAFE_NO_PAD
        .decode(payload.trim_end_matches('='))
        .map_err(|e| DomainError::MalformedToken(format!("payload is not base64url: {e}")))?;
    let claims: Claims = serde_json::from_slice(&bytes)
        .map_err(|e| DomainError::MalformedToken(format!("payload is not JSON: {e}")))?;
    let exp = claims
        .exp
        .ok_or_else(|| DomainError::MalformedToken("missing exp claim".to_string()))?;

    DateTime::from_timestamp(exp, 0)
        .ok_or_else(|| DomainError::MalformedToken(format!("exp out of range: {exp}")))
}

/// Expiry predicate with a safety margin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryPolicy {
    margin: Duration,
}

impl ExpiryPolicy {
    /// Creates a policy with the default margin.
    #[must_use]
    pub fn new() -> Self {
        Self::with_margin_seconds(DEFAULT_REFRESH_MARGIN_SECONDS)
    }

    /// Creates a policy with a custom margin.
    #[must_use]
    pub fn with_margin_seconds(seconds: i64) -> Self {
        Self {
            margin: Duration::seconds(seconds),
        }
    }

    /// Returns true if the id token must be refreshed at `now`.
    #[must_use]
    pub fn should_refresh_token(&self, id_token: &str, now: DateTime<Utc>) -> bool {
        !token_expiry(id_token).is_ok_and(|expires_at| now + self.margin < expires_at)
    }
}

impl Default for ExpiryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// What the refresh flow should do with the stored credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshPlan {
    /// No refresh token is stored; the session cannot be renewed.
    Unauthorized,
    /// The stored id token is still valid and can be reused.
    Reuse {
        /// The id token to register with the request client.
        id_token: String,
    },
    /// The session must be renewed with the provider.
    Renew {
        /// The refresh token to exchange.
        refresh_token: String,
    },
}

impl RefreshPlan {
    /// Chooses the refresh branch for the stored token set.
    ///
    /// `needs_refresh` is the expiry verdict on the stored id token; a
    /// missing id token always needs a refresh.
    #[must_use]
    pub fn decide(tokens: Option<&TokenSet>, needs_refresh: bool) -> Self {
        let Some(refresh_token) = tokens.and_then(TokenSet::refresh_token) else {
            return Self::Unauthorized;
        };
        match tokens.and_then(TokenSet::id_token) {
            Some(id_token) if !needs_refresh => Self::Reuse {
                id_token: id_token.to_string(),
            },
            _ => Self::Renew {
                refresh_token: refresh_token.to_string(),
            },
        }
    }
}

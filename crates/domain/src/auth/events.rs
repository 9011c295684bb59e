//! Outcome events and flow terminal states.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::UserDetails;

/// Failure message emitted when a refresh is attempted without a refresh token.
pub const REFRESH_UNAUTHORIZED: &str = "user was not authorized";

/// Failure message emitted when any step of a refresh fails.
pub const REFRESH_CALL_FAILED: &str = "one of the calls failed";

/// Notifications emitted by the auth flows and consumed by application state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    /// Interactive login completed.
    LoginSucceeded {
        /// Profile fetched after the login.
        user: UserDetails,
    },
    /// Interactive login failed.
    LoginFailed,
    /// Session cleared.
    LogoutSucceeded,
    /// Logout could not complete.
    LogoutFailed,
    /// A refresh has been requested.
    RefreshRequested,
    /// Session renewed.
    RefreshSucceeded {
        /// Profile fetched after the renewal.
        user: UserDetails,
    },
    /// Refresh failed.
    RefreshFailed {
        /// Why the refresh failed.
        message: String,
    },
    /// Refresh was not necessary.
    RefreshCancelled,
}

impl AuthEvent {
    /// Returns a short, stable name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::LoginSucceeded { .. } => "login_succeeded",
            Self::LoginFailed => "login_failed",
            Self::LogoutSucceeded => "logout_succeeded",
            Self::LogoutFailed => "logout_failed",
            Self::RefreshRequested => "refresh_requested",
            Self::RefreshSucceeded { .. } => "refresh_succeeded",
            Self::RefreshFailed { .. } => "refresh_failed",
            Self::RefreshCancelled => "refresh_cancelled",
        }
    }

    /// Returns the user details carried by success events.
    #[must_use]
    pub const fn user(&self) -> Option<&UserDetails> {
        match self {
            Self::LoginSucceeded { user } | Self::RefreshSucceeded { user } => Some(user),
            _ => None,
        }
    }
}

/// Why a flow ended in the cancelled state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// No refresh token was stored.
    NoRefreshToken,
    /// The stored id token is still valid.
    TokenStillValid,
}

/// Terminal state of one flow instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Every step succeeded.
    Completed,
    /// A step failed; the failure event was emitted.
    Failed {
        /// Description of the failing step.
        reason: String,
    },
    /// Nothing needed to be done, or preconditions were missing.
    Cancelled {
        /// Why the flow stopped.
        reason: CancelReason,
    },
}

impl FlowOutcome {
    /// Creates a failed outcome.
    #[must_use]
    pub fn failed(reason: impl Into<String>) -> Self {
        Self::Failed {
            reason: reason.into(),
        }
    }

    /// Returns true if the flow completed.
    #[must_use]
    pub const fn is_completed(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the flow failed.
    #[must_use]
    pub const fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// Returns true if the flow was cancelled.
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Completed => f.write_str("completed"),
            Self::Failed { reason } => write!(f, "failed: {reason}"),
            Self::Cancelled { reason } => write!(f, "cancelled: {reason:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_user_payload() {
        let user = UserDetails {
            customer_id: "c-1".to_string(),
            ..UserDetails::default()
        };
        let event = AuthEvent::RefreshSucceeded { user: user.clone() };
        assert_eq!(event.user(), Some(&user));
        assert_eq!(AuthEvent::LoginFailed.user(), None);
        assert_eq!(event.name(), "refresh_succeeded");
    }

    #[test]
    fn test_flow_outcome_predicates() {
        assert!(FlowOutcome::Completed.is_completed());
        assert!(FlowOutcome::failed("boom").is_failed());

        let cancelled = FlowOutcome::Cancelled {
            reason: CancelReason::TokenStillValid,
        };
        assert!(cancelled.is_cancelled());
        assert!(!cancelled.is_failed());
        assert_eq!(cancelled.to_string(), "cancelled: TokenStillValid");
    }
}

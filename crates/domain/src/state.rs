//! Application-wide session state.
//!
//! [`AuthState`] is what the rest of the application reads to decide
//! whether a user is signed in. It only changes by reducing
//! [`AuthEvent`]s, so every transition is driven by a flow outcome.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::auth::{AuthEvent, UserDetails};
use crate::error::{DomainError, DomainResult};

/// Signed-in status and profile of the current user.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthState {
    /// Whether the application believes a session exists.
    #[serde(default)]
    pub is_logged_in: bool,
    /// Profile of the signed-in customer.
    #[serde(default)]
    pub user_details: Option<UserDetails>,
}

impl AuthState {
    /// Applies an outcome event.
    ///
    /// Returns true if the state changed.
    pub fn apply(&mut self, event: &AuthEvent) -> bool {
        let next = match event {
            AuthEvent::LoginSucceeded { user } | AuthEvent::RefreshSucceeded { user } => Self {
                is_logged_in: true,
                user_details: Some(user.clone()),
            },
            AuthEvent::LogoutSucceeded => Self::default(),
            AuthEvent::LoginFailed
            | AuthEvent::LogoutFailed
            | AuthEvent::RefreshRequested
            | AuthEvent::RefreshFailed { .. }
            | AuthEvent::RefreshCancelled => return false,
        };
        if *self == next {
            return false;
        }
        *self = next;
        true
    }

    /// Returns the known customer id, or an empty string.
    #[must_use]
    pub fn customer_id(&self) -> &str {
        self.user_details
            .as_ref()
            .map_or("", |user| user.customer_id.as_str())
    }
}

/// Whether persisted state has finished loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistenceState {
    /// True once the persisted state has been restored.
    pub rehydrated: bool,
}

/// Foreground/background status reported by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppStatus {
    /// In the foreground and interactive.
    Active,
    /// Transitioning, not interactive.
    Inactive,
    /// Running in the background.
    Background,
}

impl AppStatus {
    /// Returns the status as a static string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Inactive => "inactive",
            Self::Background => "background",
        }
    }
}

impl fmt::Display for AppStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> DomainResult<Self> {
        match s.to_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "background" => Ok(Self::Background),
            other => Err(DomainError::UnknownStatus(other.to_string())),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn user(customer_id: &str) -> UserDetails {
        UserDetails {
            customer_id: customer_id.to_string(),
            ..UserDetails::default()
        }
    }

    #[test]
    fn test_login_success_signs_in() {
        let mut state = AuthState::default();
        assert!(state.apply(&AuthEvent::LoginSucceeded { user: user("c-1") }));
        assert!(state.is_logged_in);
        assert_eq!(state.customer_id(), "c-1");
    }

    #[test]
    fn test_logout_clears_details() {
        let mut state = AuthState {
            is_logged_in: true,
            user_details: Some(user("c-1")),
        };
        assert!(state.apply(&AuthEvent::LogoutSucceeded));
        assert_eq!(state, AuthState::default());
        assert_eq!(state.customer_id(), "");
    }

    #[test]
    fn test_failures_leave_state_untouched() {
        let mut state = AuthState {
            is_logged_in: true,
            user_details: Some(user("c-1")),
        };
        let before = state.clone();
        assert!(!state.apply(&AuthEvent::RefreshFailed {
            message: "one of the calls failed".to_string()
        }));
        assert!(!state.apply(&AuthEvent::LoginFailed));
        assert!(!state.apply(&AuthEvent::RefreshCancelled));
        assert_eq!(state, before);
    }

    #[test]
    fn test_repeated_logout_reports_no_change() {
        let mut state = AuthState::default();
        assert!(!state.apply(&AuthEvent::LogoutSucceeded));
    }

    #[test]
    fn test_app_status_parse() {
        assert_eq!("active".parse::<AppStatus>().unwrap(), AppStatus::Active);
        assert_eq!("Background".parse::<AppStatus>().unwrap(), AppStatus::Background);
        assert!("asleep".parse::<AppStatus>().is_err());
    }
}

//! Login, logout and refresh flows.
//!
//! Each flow runs its steps in a fixed order and ends in exactly one
//! [`FlowOutcome`]. Step failures never escape a flow: they become the
//! flow's failure event on the [`AppStore`].

use std::sync::Arc;

use tether_domain::{
    ANONYMOUS_CUSTOMER_ID, AuthEvent, AuthorizeOptions, CancelReason, ExpiryPolicy, FlowOutcome,
    REFRESH_CALL_FAILED, REFRESH_SCOPE, REFRESH_UNAUTHORIZED, RefreshPlan, TokenSet, UserDetails,
};

use crate::error::{ApplicationError, ApplicationResult};
use crate::ports::{
    Analytics, ApiCredentials, Clock, CustomerIdentity, CustomerProfile, IdentityProvider,
    OrderManagement, TokenStore,
};
use crate::store::AppStore;

/// External collaborators used by the auth flows.
#[derive(Clone)]
pub struct AuthServices {
    /// Identity provider issuing credentials.
    pub identity: Arc<dyn IdentityProvider>,
    /// Durable token storage.
    pub tokens: Arc<dyn TokenStore>,
    /// Credential slot of the request client.
    pub api: Arc<dyn ApiCredentials>,
    /// Profile lookup.
    pub profile: Arc<dyn CustomerProfile>,
    /// Analytics sink.
    pub analytics: Arc<dyn Analytics>,
    /// CRM identity sink.
    pub crm: Arc<dyn CustomerIdentity>,
    /// Order management.
    pub orders: Arc<dyn OrderManagement>,
    /// Time source for expiry checks.
    pub clock: Arc<dyn Clock>,
}

/// Runs the session flows against the shared store.
pub struct AuthOrchestrator {
    services: AuthServices,
    store: Arc<AppStore>,
    policy: ExpiryPolicy,
    device_id: String,
    authorize_options: AuthorizeOptions,
}

impl AuthOrchestrator {
    /// Creates an orchestrator with the default expiry policy and login options.
    #[must_use]
    pub fn new(services: AuthServices, store: Arc<AppStore>, device_id: impl Into<String>) -> Self {
        Self {
            services,
            store,
            policy: ExpiryPolicy::new(),
            device_id: device_id.into(),
            authorize_options: AuthorizeOptions::login(),
        }
    }

    /// Replaces the expiry policy.
    #[must_use]
    pub const fn with_policy(mut self, policy: ExpiryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replaces the interactive authorization options.
    #[must_use]
    pub fn with_authorize_options(mut self, options: AuthorizeOptions) -> Self {
        self.authorize_options = options;
        self
    }

    /// Returns the shared store.
    #[must_use]
    pub const fn store(&self) -> &Arc<AppStore> {
        &self.store
    }

    /// Returns the device identifier reported to the CRM when no one is signed in.
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub(crate) const fn services(&self) -> &AuthServices {
        &self.services
    }

    /// Runs the interactive login.
    pub async fn login(&self) -> FlowOutcome {
        tracing::debug!(event = "login_started", "Login started");
        match self.authorize_and_load_profile().await {
            Ok(user) => {
                let customer_id = user.customer_id.clone();
                self.store.dispatch(AuthEvent::LoginSucceeded { user });
                self.services.analytics.log_login_success(&customer_id);
                self.services.crm.notify_identified_customer(&customer_id);
                tracing::info!(event = "login_succeeded", customer_id = %customer_id, "Login succeeded");
                FlowOutcome::Completed
            }
            Err(e) => {
                tracing::error!(event = "login_failed", error = %e, "Login failed");
                self.store.dispatch(AuthEvent::LoginFailed);
                self.services.analytics.log_login_failure();
                FlowOutcome::failed(e.to_string())
            }
        }
    }

    async fn authorize_and_load_profile(&self) -> ApplicationResult<UserDetails> {
        let tokens = self
            .services
            .identity
            .authorize(&self.authorize_options)
            .await?;
        self.services.api.set_access_token(&tokens.id_token);
        self.services.tokens.save(&tokens).await?;
        Ok(self.services.profile.get_customer_info().await?)
    }

    /// Clears the session.
    pub async fn logout(&self) -> FlowOutcome {
        tracing::debug!(event = "logout_started", "Logout started");
        if let Err(e) = self.services.tokens.remove().await {
            tracing::error!(event = "logout_failed", error = %e, "Logout failed");
            self.store.dispatch(AuthEvent::LogoutFailed);
            return FlowOutcome::failed(e.to_string());
        }
        self.services.api.remove_access_token();

        let customer_id = self.store.customer_id();
        let tagged = if customer_id.is_empty() {
            ANONYMOUS_CUSTOMER_ID
        } else {
            customer_id.as_str()
        };
        self.services.analytics.log_logout_success(tagged);
        self.services.crm.notify_identified_customer(&self.device_id);
        self.services.orders.clear_fulfilled_orders();
        self.store.dispatch(AuthEvent::LogoutSucceeded);
        tracing::info!(event = "logout_succeeded", customer_id = %tagged, "Logout succeeded");
        FlowOutcome::Completed
    }

    /// Emits a refresh request and runs the refresh flow.
    pub async fn request_refresh(&self) -> FlowOutcome {
        self.store.dispatch(AuthEvent::RefreshRequested);
        self.refresh().await
    }

    /// Renews the session if the stored id token is about to expire.
    pub async fn refresh(&self) -> FlowOutcome {
        let stored = match self.services.tokens.get().await {
            Ok(stored) => stored,
            Err(e) => return self.refresh_failed(e.into()).await,
        };
        let now = self.services.clock.now();
        let needs_refresh = stored
            .as_ref()
            .and_then(TokenSet::id_token)
            .is_none_or(|id_token| self.policy.should_refresh_token(id_token, now));

        match RefreshPlan::decide(stored.as_ref(), needs_refresh) {
            RefreshPlan::Unauthorized => {
                tracing::warn!(
                    event = "refresh_unauthorized",
                    "Refresh skipped, no refresh token stored"
                );
                self.store.dispatch(AuthEvent::RefreshFailed {
                    message: REFRESH_UNAUTHORIZED.to_string(),
                });
                FlowOutcome::Cancelled {
                    reason: CancelReason::NoRefreshToken,
                }
            }
            RefreshPlan::Reuse { id_token } => {
                self.services.api.set_access_token(&id_token);
                self.services
                    .crm
                    .notify_identified_customer(&self.store.customer_id());
                self.store.dispatch(AuthEvent::RefreshCancelled);
                tracing::debug!(event = "refresh_cancelled", "Stored id token still valid");
                FlowOutcome::Cancelled {
                    reason: CancelReason::TokenStillValid,
                }
            }
            RefreshPlan::Renew { refresh_token } => match self.renew(&refresh_token).await {
                Ok(user) => {
                    let customer_id = user.customer_id.clone();
                    self.store.dispatch(AuthEvent::RefreshSucceeded { user });
                    self.services.crm.notify_identified_customer(&customer_id);
                    tracing::info!(
                        event = "refresh_succeeded",
                        customer_id = %customer_id,
                        "Session refreshed"
                    );
                    FlowOutcome::Completed
                }
                Err(e) => self.refresh_failed(e).await,
            },
        }
    }

    async fn renew(&self, refresh_token: &str) -> ApplicationResult<UserDetails> {
        let mut renewed = self
            .services
            .identity
            .refresh_token(refresh_token, REFRESH_SCOPE)
            .await?;
        if renewed.refresh_token().is_none() {
            renewed.refresh_token = Some(refresh_token.to_string());
        }
        self.services.api.set_access_token(&renewed.id_token);
        self.services.tokens.save(&renewed).await?;
        Ok(self.services.profile.get_customer_info().await?)
    }

    /// Reports a failed refresh and, for a signed-in user, replaces the
    /// broken session with a fresh interactive login.
    async fn refresh_failed(&self, error: ApplicationError) -> FlowOutcome {
        tracing::error!(event = "refresh_failed", error = %error, "Refresh failed");
        self.store.dispatch(AuthEvent::RefreshFailed {
            message: REFRESH_CALL_FAILED.to_string(),
        });

        if self.store.is_logged_in() {
            if let Err(e) = self.services.tokens.remove().await {
                tracing::warn!(
                    event = "implicit_logout_remove_failed",
                    error = %e,
                    "Could not remove tokens during implicit logout"
                );
            }
            self.services.crm.notify_identified_customer(&self.device_id);
            self.store.dispatch(AuthEvent::LogoutSucceeded);
            tracing::info!(event = "implicit_logout", "Session dropped, starting login");
            self.login().await;
        }

        FlowOutcome::failed(error.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::testing::{Harness, jwt_expiring_in, user};
    use pretty_assertions::assert_eq;
    use tether_domain::AuthState;

    #[tokio::test]
    async fn test_login_runs_steps_in_order() {
        let harness = Harness::new();
        harness.identity.authorize_with(TokenSet::new("access", "id-1", "refresh"));
        harness.profile.respond_with(user("c-1"));
        let mut events = harness.store.subscribe();

        let outcome = harness.orchestrator().login().await;

        assert_eq!(outcome, FlowOutcome::Completed);
        assert_eq!(
            harness.journal.entries(),
            vec![
                "authorize(openid offline_access email profile, firebase-auth, ephemeral)",
                "set_access_token(id-1)",
                "save_tokens(id-1)",
                "get_customer_info",
                "log_login_success(c-1)",
                "crm(c-1)",
            ]
        );
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::LoginSucceeded { user: user("c-1") }
        );
        assert!(harness.store.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_failure_when_user_cancels() {
        let harness = Harness::new();
        let mut events = harness.store.subscribe();

        let outcome = harness.orchestrator().login().await;

        assert!(outcome.is_failed());
        assert_eq!(
            harness.journal.entries(),
            vec![
                "authorize(openid offline_access email profile, firebase-auth, ephemeral)",
                "log_login_failure",
            ]
        );
        assert_eq!(events.recv().await.unwrap(), AuthEvent::LoginFailed);
        assert!(!harness.store.is_logged_in());
    }

    #[tokio::test]
    async fn test_login_failure_when_profile_lookup_fails() {
        let harness = Harness::new();
        harness.identity.authorize_with(TokenSet::new("access", "id-1", "refresh"));

        let outcome = harness.orchestrator().login().await;

        assert!(outcome.is_failed());
        assert_eq!(
            harness.journal.entries().last().map(String::as_str),
            Some("log_login_failure")
        );
        // Tokens saved before the failing step stay in place.
        assert!(harness.tokens.snapshot().await.is_some());
    }

    #[tokio::test]
    async fn test_logout_runs_steps_in_order() {
        let harness = Harness::new();
        harness.store.dispatch(AuthEvent::LoginSucceeded { user: user("c-7") });
        harness.journal.clear();
        let mut events = harness.store.subscribe();

        let outcome = harness.orchestrator().logout().await;

        assert_eq!(outcome, FlowOutcome::Completed);
        assert_eq!(
            harness.journal.entries(),
            vec![
                "remove_tokens",
                "remove_access_token",
                "log_logout_success(c-7)",
                "crm(device-1)",
                "clear_fulfilled_orders",
            ]
        );
        assert_eq!(events.recv().await.unwrap(), AuthEvent::LogoutSucceeded);
        assert_eq!(harness.store.auth_state(), AuthState::default());
    }

    #[tokio::test]
    async fn test_logout_twice_succeeds() {
        let harness = Harness::new();
        let orchestrator = harness.orchestrator();

        assert_eq!(orchestrator.logout().await, FlowOutcome::Completed);
        assert_eq!(orchestrator.logout().await, FlowOutcome::Completed);

        assert!(harness.tokens.snapshot().await.is_none());
        assert_eq!(
            harness
                .journal
                .entries()
                .iter()
                .filter(|e| e.as_str() == "log_logout_success(anonymous)")
                .count(),
            2
        );
    }

    #[tokio::test]
    async fn test_logout_failure_when_removal_fails() {
        let harness = Harness::new();
        harness.tokens.fail_remove();
        let mut events = harness.store.subscribe();

        let outcome = harness.orchestrator().logout().await;

        assert!(outcome.is_failed());
        assert_eq!(events.recv().await.unwrap(), AuthEvent::LogoutFailed);
        assert_eq!(harness.journal.entries(), vec!["remove_tokens"]);
    }

    #[tokio::test]
    async fn test_refresh_without_refresh_token_is_unauthorized() {
        let harness = Harness::new();
        let mut events = harness.store.subscribe();

        let outcome = harness.orchestrator().refresh().await;

        assert_eq!(
            outcome,
            FlowOutcome::Cancelled {
                reason: CancelReason::NoRefreshToken
            }
        );
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::RefreshFailed {
                message: "user was not authorized".to_string()
            }
        );
        assert_eq!(harness.journal.entries(), vec!["get_tokens"]);
    }

    #[tokio::test]
    async fn test_refresh_reuses_valid_token() {
        let harness = Harness::new();
        let id_token = jwt_expiring_in(3600);
        harness
            .seed_tokens(TokenSet::new("access", id_token.clone(), "refresh"))
            .await;
        harness.store.dispatch(AuthEvent::LoginSucceeded { user: user("c-3") });
        harness.journal.clear();
        let before = harness.store.auth_state();
        let mut events = harness.store.subscribe();

        let outcome = harness.orchestrator().refresh().await;

        assert_eq!(
            outcome,
            FlowOutcome::Cancelled {
                reason: CancelReason::TokenStillValid
            }
        );
        assert_eq!(
            harness.journal.entries(),
            vec![
                "get_tokens".to_string(),
                format!("set_access_token({id_token})"),
                "crm(c-3)".to_string(),
            ]
        );
        assert_eq!(events.recv().await.unwrap(), AuthEvent::RefreshCancelled);
        assert_eq!(harness.store.auth_state(), before);
    }

    #[tokio::test]
    async fn test_refresh_renews_expired_token() {
        let harness = Harness::new();
        harness
            .seed_tokens(TokenSet::new("access", jwt_expiring_in(30), "refresh-1"))
            .await;
        harness.journal.clear();
        harness
            .identity
            .refresh_with(TokenSet::new("access-2", "id-2", "refresh-2"));
        harness.profile.respond_with(user("c-4"));

        let outcome = harness.orchestrator().refresh().await;

        assert_eq!(outcome, FlowOutcome::Completed);
        assert_eq!(
            harness.journal.entries(),
            vec![
                "get_tokens",
                "refresh_token(refresh-1, openid offline_access profile email)",
                "set_access_token(id-2)",
                "save_tokens(id-2)",
                "get_customer_info",
                "crm(c-4)",
            ]
        );
        assert_eq!(harness.store.customer_id(), "c-4");
        assert_eq!(
            harness.tokens.snapshot().await,
            Some(TokenSet::new("access-2", "id-2", "refresh-2"))
        );
    }

    #[tokio::test]
    async fn test_refresh_keeps_refresh_token_when_not_rotated() {
        let harness = Harness::new();
        harness
            .seed_tokens(TokenSet::new("access", "not-a-jwt", "refresh-1"))
            .await;
        harness.identity.refresh_with(TokenSet {
            access_token: "access-2".to_string(),
            id_token: "id-2".to_string(),
            refresh_token: None,
        });
        harness.profile.respond_with(user("c-4"));

        let outcome = harness.orchestrator().refresh().await;

        assert_eq!(outcome, FlowOutcome::Completed);
        assert_eq!(
            harness.tokens.snapshot().await,
            Some(TokenSet::new("access-2", "id-2", "refresh-1"))
        );
    }

    #[tokio::test]
    async fn test_refresh_failure_while_logged_in_restarts_login() {
        let harness = Harness::new();
        harness
            .seed_tokens(TokenSet::new("access", jwt_expiring_in(-10), "refresh-1"))
            .await;
        harness.store.dispatch(AuthEvent::LoginSucceeded { user: user("c-5") });
        harness.journal.clear();
        let mut events = harness.store.subscribe();

        let outcome = harness.orchestrator().refresh().await;

        assert!(outcome.is_failed());
        assert_eq!(
            harness.journal.entries(),
            vec![
                "get_tokens",
                "refresh_token(refresh-1, openid offline_access profile email)",
                "remove_tokens",
                "crm(device-1)",
                "authorize(openid offline_access email profile, firebase-auth, ephemeral)",
                "log_login_failure",
            ]
        );
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::RefreshFailed {
                message: "one of the calls failed".to_string()
            }
        );
        assert_eq!(events.recv().await.unwrap(), AuthEvent::LogoutSucceeded);
        assert_eq!(events.recv().await.unwrap(), AuthEvent::LoginFailed);
        assert!(harness.tokens.snapshot().await.is_none());
        assert!(!harness.store.is_logged_in());
    }

    #[tokio::test]
    async fn test_refresh_failure_while_logged_out_only_reports() {
        let harness = Harness::new();
        harness
            .seed_tokens(TokenSet::new("access", jwt_expiring_in(-10), "refresh-1"))
            .await;
        harness.journal.clear();

        let outcome = harness.orchestrator().refresh().await;

        assert!(outcome.is_failed());
        assert_eq!(
            harness.journal.entries(),
            vec![
                "get_tokens",
                "refresh_token(refresh-1, openid offline_access profile email)",
            ]
        );
        assert!(harness.tokens.snapshot().await.is_some());
    }

    #[tokio::test]
    async fn test_unreadable_tokens_while_logged_in_restart_login() {
        let harness = Harness::new();
        harness.store.dispatch(AuthEvent::LoginSucceeded { user: user("c-6") });
        harness.tokens.fail_get();
        harness.journal.clear();
        let mut events = harness.store.subscribe();

        let outcome = harness.orchestrator().refresh().await;

        assert!(outcome.is_failed());
        assert_eq!(
            harness.journal.entries(),
            vec![
                "get_tokens",
                "remove_tokens",
                "crm(device-1)",
                "authorize(openid offline_access email profile, firebase-auth, ephemeral)",
                "log_login_failure",
            ]
        );
        assert_eq!(
            events.recv().await.unwrap(),
            AuthEvent::RefreshFailed {
                message: "one of the calls failed".to_string()
            }
        );
        assert_eq!(events.recv().await.unwrap(), AuthEvent::LogoutSucceeded);
        assert!(!harness.store.is_logged_in());
    }

    #[tokio::test]
    async fn test_unreadable_tokens_while_logged_out_only_report() {
        let harness = Harness::new();
        harness.tokens.fail_get();

        let outcome = harness.orchestrator().refresh().await;

        assert!(outcome.is_failed());
        assert_eq!(harness.journal.entries(), vec!["get_tokens"]);
    }

    #[tokio::test]
    async fn test_request_refresh_emits_request_first() {
        let harness = Harness::new();
        let mut events = harness.store.subscribe();

        harness.orchestrator().request_refresh().await;

        assert_eq!(events.recv().await.unwrap(), AuthEvent::RefreshRequested);
        assert!(matches!(
            events.recv().await.unwrap(),
            AuthEvent::RefreshFailed { .. }
        ));
    }
}

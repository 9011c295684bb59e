//! Shared application store.
//!
//! Holds the [`AuthState`] every other part of the application reads, the
//! rehydration flag, and a broadcast of every [`AuthEvent`] dispatched by
//! the flows.

use parking_lot::RwLock;
use tether_domain::{AuthEvent, AuthState, PersistenceState, UserDetails};
use tokio::sync::{broadcast, watch};

const EVENT_CAPACITY: usize = 64;

/// Application store reduced from auth outcome events.
#[derive(Debug)]
pub struct AppStore {
    auth: RwLock<AuthState>,
    persistence: watch::Sender<PersistenceState>,
    events: broadcast::Sender<AuthEvent>,
}

impl AppStore {
    /// Creates a logged-out, not yet rehydrated store.
    #[must_use]
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            auth: RwLock::new(AuthState::default()),
            persistence: watch::Sender::new(PersistenceState::default()),
            events,
        }
    }

    /// Reduces `event` into the auth state and broadcasts it.
    pub fn dispatch(&self, event: AuthEvent) {
        let changed = self.auth.write().apply(&event);
        tracing::debug!(event = event.name(), changed, "Auth event dispatched");
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Subscribes to every event dispatched from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// Returns a snapshot of the auth state.
    #[must_use]
    pub fn auth_state(&self) -> AuthState {
        self.auth.read().clone()
    }

    /// Returns true if a session is believed to exist.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.auth.read().is_logged_in
    }

    /// Returns the signed-in user's profile.
    #[must_use]
    pub fn user_details(&self) -> Option<UserDetails> {
        self.auth.read().user_details.clone()
    }

    /// Returns the customer id of the signed-in user, or an empty string.
    #[must_use]
    pub fn customer_id(&self) -> String {
        self.auth.read().customer_id().to_string()
    }

    /// Returns the rehydration flag.
    #[must_use]
    pub fn persistence_state(&self) -> PersistenceState {
        *self.persistence.borrow()
    }

    /// Installs restored state, if any, and fires the rehydrated signal.
    ///
    /// Only the first call has an effect.
    pub fn rehydrate(&self, restored: Option<AuthState>) {
        if self.persistence.borrow().rehydrated {
            tracing::warn!(event = "store_rehydrate_ignored", "Store already rehydrated");
            return;
        }
        if let Some(state) = restored {
            *self.auth.write() = state;
        }
        self.persistence
            .send_replace(PersistenceState { rehydrated: true });
    }

    /// Waits until the store has been rehydrated.
    ///
    /// Returns immediately if that already happened.
    pub async fn wait_rehydrated(&self) {
        let mut rx = self.persistence.subscribe();
        // The sender lives as long as `self`, so the wait cannot fail.
        let _ = rx.wait_for(|state| state.rehydrated).await;
    }
}

impl Default for AppStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Arc;
    use std::time::Duration;

    fn user(customer_id: &str) -> UserDetails {
        UserDetails {
            customer_id: customer_id.to_string(),
            ..UserDetails::default()
        }
    }

    #[test]
    fn test_dispatch_reduces_state() {
        let store = AppStore::new();

        store.dispatch(AuthEvent::LoginSucceeded { user: user("c-1") });
        assert!(store.is_logged_in());
        assert_eq!(store.customer_id(), "c-1");

        store.dispatch(AuthEvent::RefreshFailed {
            message: "boom".to_string(),
        });
        assert!(store.is_logged_in());

        store.dispatch(AuthEvent::LogoutSucceeded);
        assert_eq!(store.auth_state(), AuthState::default());
        assert_eq!(store.customer_id(), "");
    }

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let store = AppStore::new();
        let mut rx = store.subscribe();

        store.dispatch(AuthEvent::RefreshRequested);
        store.dispatch(AuthEvent::RefreshCancelled);

        assert_eq!(rx.recv().await.unwrap(), AuthEvent::RefreshRequested);
        assert_eq!(rx.recv().await.unwrap(), AuthEvent::RefreshCancelled);
    }

    #[test]
    fn test_rehydrate_installs_restored_state_once() {
        let store = AppStore::new();
        assert!(!store.persistence_state().rehydrated);

        store.rehydrate(Some(AuthState {
            is_logged_in: true,
            user_details: Some(user("c-9")),
        }));
        assert!(store.persistence_state().rehydrated);
        assert_eq!(store.customer_id(), "c-9");

        store.rehydrate(Some(AuthState::default()));
        assert!(store.is_logged_in());
    }

    #[tokio::test]
    async fn test_wait_rehydrated_returns_after_signal() {
        let store = Arc::new(AppStore::new());
        let waiter = {
            let store = Arc::clone(&store);
            tokio::spawn(async move { store.wait_rehydrated().await })
        };

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(!waiter.is_finished());

        store.rehydrate(None);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should finish")
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_rehydrated_when_already_rehydrated() {
        let store = AppStore::new();
        store.rehydrate(None);

        tokio::time::timeout(Duration::from_secs(1), store.wait_rehydrated())
            .await
            .expect("should not block");
    }
}

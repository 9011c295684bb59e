//! Restoring and saving the application store across restarts.

use std::sync::Arc;

use tether_domain::AuthEvent;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::ports::SessionPersistence;
use crate::store::AppStore;

/// Loads persisted state into `store` and fires the rehydrated signal.
///
/// Unreadable state is logged and the store starts logged out; the signal
/// fires either way.
pub async fn restore(store: &AppStore, persistence: &dyn SessionPersistence) {
    let restored = match persistence.load().await {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!(
                event = "session_restore_failed",
                error = %e,
                "Could not restore session state, starting logged out"
            );
            None
        }
    };
    tracing::debug!(
        event = "session_restored",
        found = restored.is_some(),
        "Session state restored"
    );
    store.rehydrate(restored);
}

const fn changes_state(event: &AuthEvent) -> bool {
    matches!(
        event,
        AuthEvent::LoginSucceeded { .. }
            | AuthEvent::RefreshSucceeded { .. }
            | AuthEvent::LogoutSucceeded
    )
}

/// Spawns a task saving the auth state after every state-changing event.
///
/// Subscribes before returning, so no event dispatched afterwards is
/// missed. The task ends when the store is dropped.
pub fn spawn_persister(
    store: &Arc<AppStore>,
    persistence: Arc<dyn SessionPersistence>,
) -> JoinHandle<()> {
    let mut events = store.subscribe();
    let store = Arc::downgrade(store);

    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) if changes_state(&event) => {}
                Ok(_) => continue,
                // Missed events may have changed state; save what is current.
                Err(RecvError::Lagged(_)) => {}
                Err(RecvError::Closed) => break,
            }
            let Some(store) = store.upgrade() else { break };
            let state = store.auth_state();
            drop(store);
            if let Err(e) = persistence.save(&state).await {
                tracing::error!(
                    event = "session_save_failed",
                    error = %e,
                    "Could not save session state"
                );
            }
        }
    })
}

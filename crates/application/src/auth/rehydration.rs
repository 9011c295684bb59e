//! Session recovery after the persisted state has been restored.

use tether_domain::FlowOutcome;

use super::orchestrator::AuthOrchestrator;
use super::supervisor::{AuthCommand, AuthCommands};

/// What rehydration decided to do with the restored session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RehydrationDecision {
    /// Stored tokens were found and the refresh flow ran.
    Refreshed(FlowOutcome),
    /// No tokens but the restored state claimed a session; a logout was requested.
    LogoutRequested,
    /// No tokens and no session; the device was identified to the CRM.
    Anonymous,
}

/// Waits for the rehydrated signal, then reconciles the restored state
/// with the token store.
pub async fn rehydrate_session(
    orchestrator: &AuthOrchestrator,
    commands: &AuthCommands,
) -> RehydrationDecision {
    let store = orchestrator.store();
    store.wait_rehydrated().await;

    let stored = match orchestrator.services().tokens.get().await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::warn!(
                event = "rehydration_tokens_unreadable",
                error = %e,
                "Could not read stored tokens, treating session as absent"
            );
            None
        }
    };

    if stored.is_some() {
        tracing::debug!(event = "rehydration_refresh", "Stored tokens found");
        return RehydrationDecision::Refreshed(orchestrator.request_refresh().await);
    }

    if store.is_logged_in() {
        tracing::info!(
            event = "rehydration_logout",
            "Session state without tokens, requesting logout"
        );
        commands.send(AuthCommand::Logout);
        return RehydrationDecision::LogoutRequested;
    }

    orchestrator
        .services()
        .crm
        .notify_identified_customer(orchestrator.device_id());
    RehydrationDecision::Anonymous
}

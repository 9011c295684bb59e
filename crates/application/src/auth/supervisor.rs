//! Long-lived tasks dispatching auth flows.
//!
//! The auth supervisor runs a login or logout flow for every command. The
//! session supervisor performs rehydration once and then runs a refresh
//! every time the application becomes active. Flows are spawned, not
//! awaited inline, so a slow interactive login never blocks the next
//! command.

use std::sync::Arc;

use tether_domain::{AppStatus, FlowOutcome};
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinHandle, JoinSet};

use super::orchestrator::AuthOrchestrator;
use super::rehydration::rehydrate_session;

/// Requests handled by the auth supervisor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthCommand {
    /// Start the interactive login.
    Login,
    /// Clear the session.
    Logout,
}

impl AuthCommand {
    const fn name(self) -> &'static str {
        match self {
            Self::Login => "login",
            Self::Logout => "logout",
        }
    }
}

/// Cloneable handle for sending [`AuthCommand`]s.
#[derive(Debug, Clone)]
pub struct AuthCommands(mpsc::UnboundedSender<AuthCommand>);

impl AuthCommands {
    /// Creates a handle and the receiving end.
    #[must_use]
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<AuthCommand>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self(tx), rx)
    }

    /// Queues a command.
    ///
    /// Returns false if the supervisor has stopped.
    pub fn send(&self, command: AuthCommand) -> bool {
        if self.0.send(command).is_err() {
            tracing::warn!(
                event = "auth_command_dropped",
                command = command.name(),
                "Auth supervisor is not running"
            );
            return false;
        }
        true
    }

    /// Requests a login.
    pub fn login(&self) -> bool {
        self.send(AuthCommand::Login)
    }

    /// Requests a logout.
    pub fn logout(&self) -> bool {
        self.send(AuthCommand::Logout)
    }
}

/// Cloneable handle for reporting [`AppStatus`] transitions.
#[derive(Debug, Clone)]
pub struct StatusReporter(mpsc::UnboundedSender<AppStatus>);

impl StatusReporter {
    /// Reports a status transition.
    ///
    /// Returns false if the supervisor has stopped.
    pub fn report(&self, status: AppStatus) -> bool {
        self.0.send(status).is_ok()
    }
}

/// Handles to the running supervisors.
#[derive(Debug)]
pub struct Supervisors {
    commands: AuthCommands,
    status: StatusReporter,
    auth: JoinHandle<()>,
    session: JoinHandle<()>,
}

impl Supervisors {
    /// Spawns the auth and session supervisors.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(orchestrator: Arc<AuthOrchestrator>) -> Self {
        let (commands, command_rx) = AuthCommands::channel();
        let (status_tx, status_rx) = mpsc::unbounded_channel();

        let auth = tokio::spawn(run_auth_supervisor(Arc::clone(&orchestrator), command_rx));
        let session = tokio::spawn(run_session_supervisor(
            orchestrator,
            commands.clone(),
            status_rx,
        ));

        Self {
            commands,
            status: StatusReporter(status_tx),
            auth,
            session,
        }
    }

    /// Returns a handle for login/logout requests.
    #[must_use]
    pub fn commands(&self) -> AuthCommands {
        self.commands.clone()
    }

    /// Returns a handle for status transitions.
    #[must_use]
    pub fn status(&self) -> StatusReporter {
        self.status.clone()
    }

    /// Stops both supervisors and every flow they are running.
    pub async fn shutdown(self) {
        self.auth.abort();
        self.session.abort();
        // Cancellation is the expected result.
        let _ = self.auth.await;
        let _ = self.session.await;
        tracing::debug!(event = "supervisors_stopped", "Auth supervisors stopped");
    }
}

fn log_joined(result: Result<(&'static str, FlowOutcome), JoinError>) {
    match result {
        Ok((flow, outcome)) => {
            tracing::debug!(event = "flow_finished", flow, outcome = %outcome, "Flow finished");
        }
        Err(e) if e.is_cancelled() => {}
        Err(e) => {
            tracing::error!(event = "flow_panicked", error = %e, "Flow task panicked");
        }
    }
}

async fn run_auth_supervisor(
    orchestrator: Arc<AuthOrchestrator>,
    mut commands: mpsc::UnboundedReceiver<AuthCommand>,
) {
    let mut flows = JoinSet::new();
    loop {
        tokio::select! {
            command = commands.recv() => {
                let Some(command) = command else { break };
                let orchestrator = Arc::clone(&orchestrator);
                flows.spawn(async move {
                    let outcome = match command {
                        AuthCommand::Login => orchestrator.login().await,
                        AuthCommand::Logout => orchestrator.logout().await,
                    };
                    (command.name(), outcome)
                });
            }
            Some(joined) = flows.join_next(), if !flows.is_empty() => log_joined(joined),
        }
    }
    while let Some(joined) = flows.join_next().await {
        log_joined(joined);
    }
}

async fn run_session_supervisor(
    orchestrator: Arc<AuthOrchestrator>,
    commands: AuthCommands,
    mut statuses: mpsc::UnboundedReceiver<AppStatus>,
) {
    let decision = rehydrate_session(&orchestrator, &commands).await;
    tracing::info!(event = "rehydration_finished", decision = ?decision, "Session rehydrated");

    let mut flows = JoinSet::new();
    loop {
        tokio::select! {
            status = statuses.recv() => {
                match status {
                    Some(AppStatus::Active) => {
                        let orchestrator = Arc::clone(&orchestrator);
                        flows.spawn(async move { ("refresh", orchestrator.request_refresh().await) });
                    }
                    Some(status) => {
                        tracing::debug!(event = "status_ignored", status = %status, "Status change ignored");
                    }
                    None => break,
                }
            }
            Some(joined) = flows.join_next(), if !flows.is_empty() => log_joined(joined),
        }
    }
    while let Some(joined) = flows.join_next().await {
        log_joined(joined);
    }
}

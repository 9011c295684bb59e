//! Tether - Main Entry Point
//!
//! Wires the adapters into the session flows, restores the previous
//! session and reads commands from standard input until `quit` or Ctrl-C.

mod console;

use std::sync::Arc;

use tether_application::ports::SessionPersistence;
use tether_application::{AppStore, AuthOrchestrator, AuthServices, Supervisors};
use tether_domain::AuthorizeOptions;
use tether_infrastructure::{
    ApiClient, AppConfig, ChannelOrderManagement, FileSessionPersistence, FileTokenStore,
    HttpCustomerProfile, LoopbackAgent, OidcIdentityProvider, OidcSettings, SystemClock,
    TracingAnalytics, load_or_create_device_id,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::console::{Command, HELP};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    let data_dir = config.storage.resolve_dir()?;
    let device_id = load_or_create_device_id(&data_dir).await?;

    let api = ApiClient::with_settings(
        config.api.base_url.clone(),
        config.api.retry_policy(),
        config.api.timeout(),
    )?;
    let identity = OidcIdentityProvider::new(
        OidcSettings {
            domain: config.identity.domain.clone(),
            client_id: config.identity.client_id.clone(),
            audience: config.identity.audience.clone(),
            timeout: config.identity.timeout(),
        },
        Arc::new(LoopbackAgent::new(config.identity.callback_port)),
    )?;
    let orders = ChannelOrderManagement::new();
    spawn_order_listener(&orders);

    let services = AuthServices {
        identity: Arc::new(identity),
        tokens: Arc::new(FileTokenStore::new(&data_dir)),
        api: Arc::new(api.clone()),
        profile: Arc::new(HttpCustomerProfile::new(api, config.api.profile_path.clone())),
        analytics: Arc::new(TracingAnalytics::new()),
        crm: Arc::new(TracingAnalytics::new()),
        orders: Arc::new(orders),
        clock: Arc::new(SystemClock::new()),
    };
    let store = Arc::new(AppStore::new());
    let orchestrator = AuthOrchestrator::new(services, Arc::clone(&store), device_id.clone())
        .with_authorize_options(
            AuthorizeOptions::login().with_connection(config.identity.connection.clone()),
        );

    let persistence: Arc<dyn SessionPersistence> =
        Arc::new(FileSessionPersistence::new(&data_dir));
    let persister = tether_application::spawn_persister(&store, Arc::clone(&persistence));
    let supervisors = Supervisors::start(Arc::new(orchestrator));
    tether_application::restore(&store, persistence.as_ref()).await;

    tracing::info!(
        event = "started",
        device_id = %device_id,
        data_dir = %data_dir.display(),
        "Tether started"
    );
    println!("{HELP}");

    run_console(&store, &supervisors).await?;

    tracing::info!(event = "shutting_down", "Shutting down");
    supervisors.shutdown().await;
    persister.abort();
    Ok(())
}

/// Dispatches console commands until `quit`, end of input or Ctrl-C.
async fn run_console(store: &AppStore, supervisors: &Supervisors) -> std::io::Result<()> {
    let commands = supervisors.commands();
    let status = supervisors.status();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => return Ok(()),
        };
        let Some(line) = line else { return Ok(()) };
        if line.trim().is_empty() {
            continue;
        }

        match Command::parse(&line) {
            Some(Command::Login) => {
                commands.login();
            }
            Some(Command::Logout) => {
                commands.logout();
            }
            Some(Command::Status(next)) => {
                status.report(next);
            }
            Some(Command::Show) => print_session(store),
            Some(Command::Help) => println!("{HELP}"),
            Some(Command::Quit) => return Ok(()),
            None => println!("unknown command: {}\n{HELP}", line.trim()),
        }
    }
}

fn print_session(store: &AppStore) {
    match store.user_details() {
        Some(user) if store.is_logged_in() => println!(
            "logged in as {} {} <{}> ({})",
            user.first_name, user.last_name, user.email, user.customer_id
        ),
        _ if store.is_logged_in() => println!("logged in"),
        _ => println!("anonymous"),
    }
}

/// Stands in for the order module: logs what it is told to do.
fn spawn_order_listener(orders: &ChannelOrderManagement) {
    let mut commands = orders.subscribe();
    tokio::spawn(async move {
        while let Ok(command) = commands.recv().await {
            tracing::info!(event = "order_command", command = ?command, "Order command");
        }
    });
}

//! Fire-and-forget observers.
//!
//! Analytics and CRM notifications become structured `tracing` events on
//! the `analytics` target, so any subscriber can ship them. Order
//! management is a broadcast channel the order module listens on.

use tether_application::ports::{Analytics, CustomerIdentity, OrderManagement};
use tokio::sync::broadcast;

/// `tracing` target of analytics and CRM events.
pub const ANALYTICS_TARGET: &str = "analytics";

/// Analytics and CRM sink writing `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnalytics;

impl TracingAnalytics {
    /// Creates the sink.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Analytics for TracingAnalytics {
    fn log_login_success(&self, customer_id: &str) {
        tracing::info!(target: ANALYTICS_TARGET, event = "login_success", customer_id, "Login success");
    }

    fn log_login_failure(&self) {
        tracing::info!(target: ANALYTICS_TARGET, event = "login_failure", "Login failure");
    }

    fn log_logout_success(&self, customer_id: &str) {
        tracing::info!(target: ANALYTICS_TARGET, event = "logout_success", customer_id, "Logout success");
    }
}

impl CustomerIdentity for TracingAnalytics {
    fn notify_identified_customer(&self, id: &str) {
        tracing::info!(target: ANALYTICS_TARGET, event = "identify", id, "Customer identified");
    }
}

/// Messages for the order-management module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderCommand {
    /// Drop in-flight and fulfilled order state.
    ClearFulfilled,
}

/// [`OrderManagement`] publishing [`OrderCommand`]s.
#[derive(Debug, Clone)]
pub struct ChannelOrderManagement {
    sender: broadcast::Sender<OrderCommand>,
}

impl ChannelOrderManagement {
    /// Creates the channel.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(16);
        Self { sender }
    }

    /// Subscribes to commands sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<OrderCommand> {
        self.sender.subscribe()
    }
}

impl Default for ChannelOrderManagement {
    fn default() -> Self {
        Self::new()
    }
}

impl OrderManagement for ChannelOrderManagement {
    fn clear_fulfilled_orders(&self) {
        if self.sender.send(OrderCommand::ClearFulfilled).is_err() {
            tracing::debug!(event = "orders_unobserved", "No order module listening");
        }
    }
}

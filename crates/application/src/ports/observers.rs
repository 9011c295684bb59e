//! Fire-and-forget observers notified by the auth flows.
//!
//! None of these calls may block or fail a flow, so the methods are
//! synchronous and infallible. Adapters that need I/O must hand the work
//! off instead of awaiting it.

/// Product analytics sink.
pub trait Analytics: Send + Sync {
    /// Records a successful login.
    fn log_login_success(&self, customer_id: &str);

    /// Records a failed login.
    fn log_login_failure(&self);

    /// Records a logout.
    fn log_logout_success(&self, customer_id: &str);
}

/// CRM/engagement SDK that tracks who is using the device.
pub trait CustomerIdentity: Send + Sync {
    /// Identifies the current person by customer id or device id.
    fn notify_identified_customer(&self, id: &str);
}

/// Order-management module.
pub trait OrderManagement: Send + Sync {
    /// Drops in-flight and fulfilled order state after a logout.
    fn clear_fulfilled_orders(&self);
}

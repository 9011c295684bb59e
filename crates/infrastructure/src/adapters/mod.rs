//! Adapters for the application ports.

mod customer_profile;
mod observers;
mod system_clock;

pub use customer_profile::{DEFAULT_PROFILE_PATH, HttpCustomerProfile};
pub use observers::{ANALYTICS_TARGET, ChannelOrderManagement, OrderCommand, TracingAnalytics};
pub use system_clock::SystemClock;

//! Authentication domain types

mod events;
mod expiry;
mod types;

pub use events::{AuthEvent, CancelReason, FlowOutcome, REFRESH_CALL_FAILED, REFRESH_UNAUTHORIZED};
pub use expiry::{DEFAULT_REFRESH_MARGIN_SECONDS, ExpiryPolicy, RefreshPlan, token_expiry};
pub use types::{
    ANONYMOUS_CUSTOMER_ID, AuthorizeOptions, DEFAULT_CONNECTION, LOGIN_SCOPE, REFRESH_SCOPE,
    TokenSet, UserDetails,
};

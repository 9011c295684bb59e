//! Response-side types

mod error;

pub use error::{ProblemKind, ResponseError, UNKNOWN_NETWORK_ERROR};

//! Request-side types

mod method;

pub use method::HttpMethod;

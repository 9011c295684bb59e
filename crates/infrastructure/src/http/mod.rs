//! HTTP infrastructure.
//!
//! This module provides:
//! - The resilient request client shared by the application
//! - Retry budget and backoff
//! - Per-call request options

mod client;
mod options;
mod retry;

pub use client::{ApiClient, DEFAULT_HEADERS, DEFAULT_TIMEOUT};
pub use options::RequestOptions;
pub use retry::{DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_MAX, DEFAULT_RETRIES, RetryPolicy};

//! ID generation utilities.

use uuid::Uuid;

/// Generates a random per-installation device identifier.
#[must_use]
pub fn generate_device_id() -> String {
    Uuid::new_v4().to_string()
}

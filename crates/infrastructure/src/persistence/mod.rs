//! On-disk storage adapters.
//!
//! Everything lives as small JSON files in one data directory:
//! - `tokens.json` holds the session credentials (owner-only)
//! - `session.json` holds the persisted auth state
//! - `device.json` holds the device identifier

mod device;
mod json_file;
mod session_store;
mod token_store;

pub use device::{DEVICE_FILE, load_or_create_device_id};
pub use json_file::JsonFile;
pub use session_store::{FileSessionPersistence, SESSION_FILE};
pub use token_store::{FileTokenStore, TOKENS_FILE};

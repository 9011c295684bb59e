//! Per-installation device identifier.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tether_application::ports::StorageError;
use tether_domain::generate_device_id;

use super::json_file::JsonFile;

/// File name of the device identifier.
pub const DEVICE_FILE: &str = "device.json";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeviceRecord {
    device_id: String,
}

/// Returns the device id stored in `dir`, creating one on first use.
///
/// # Errors
///
/// Returns an error if the file cannot be read or written.
pub async fn load_or_create_device_id(dir: &Path) -> Result<String, StorageError> {
    let file = JsonFile::new(dir.join(DEVICE_FILE));
    if let Some(record) = file.read::<DeviceRecord>().await? {
        return Ok(record.device_id);
    }

    let record = DeviceRecord {
        device_id: generate_device_id(),
    };
    file.write(&record).await?;
    tracing::info!(event = "device_registered", device_id = %record.device_id, "New device id created");
    Ok(record.device_id)
}

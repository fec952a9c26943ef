pub mod code_size;
pub mod compile;
pub mod config;
pub mod extract;
pub mod plots;
pub mod report;

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Write a stage artifact as pretty-printed JSON, creating its directory.
pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
    }

    let raw = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize {}: {e}", path.display()))?;
    fs::write(path, raw).map_err(|e| format!("Failed to write {}: {e}", path.display()))
}

/// Read an upstream stage artifact.
pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let raw = fs::read_to_string(path).map_err(|e| {
        format!(
            "Failed to read {}: {e}. Run the upstream stage first.",
            path.display()
        )
    })?;
    serde_json::from_str(&raw).map_err(|e| format!("Malformed {}: {e}", path.display()))
}

use anyhow::Result;
use serde::Serialize;
use std::{fs, path::Path};

/// Writes the last recommendation response, pretty-printed, for debugging.
/// Overwrites any previous dump and creates the parent directory.
pub fn save_prediction(path: impl AsRef<Path>, prediction: &impl Serialize) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let raw = serde_json::to_string_pretty(prediction)?;
    fs::write(path, raw)?;
    Ok(())
}

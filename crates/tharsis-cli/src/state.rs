//! Local record of the last actual state seen for one managed identity.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tharsis_core::ManagedIdentity;

pub fn load_state(path: &Path) -> Result<Option<ManagedIdentity>> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file: {}", path.display()))?;
    let identity = serde_json::from_str(&content)
        .with_context(|| format!("Invalid state file: {}", path.display()))?;
    Ok(Some(identity))
}

pub fn save_state(path: &Path, identity: &ManagedIdentity) -> Result<()> {
    let content = serde_json::to_string_pretty(identity)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write state file: {}", path.display()))?;
    Ok(())
}

/// Returns false when there was nothing to remove.
pub fn remove_state(path: &Path) -> Result<bool> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove state file: {}", path.display()))?;
        Ok(true)
    } else {
        Ok(false)
    }
}

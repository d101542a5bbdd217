//! Persistent storage for shutter
//!
//! One serialized identity snapshot plus the settings file, both under the
//! platform config directory:
//!
//! ~/.config/shutter/
//! ├── config.toml      # Settings
//! └── identity.json    # Persisted login session (user + token)

use crate::core::types::CurrentUser;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Config directory name
const SHUTTER_DIR: &str = "shutter";

/// Identity snapshot file name
const IDENTITY_FILE: &str = "identity.json";

/// The platform config root for shutter, created on demand by the stores.
pub fn config_root() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join(SHUTTER_DIR)
    } else {
        // Fallback to home directory
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join(SHUTTER_DIR)
    }
}

/// Stores the single identity snapshot.
///
/// Missing and malformed snapshots both read as "no persisted identity";
/// a corrupt file must never keep the client from starting.
pub struct IdentityStore {
    path: PathBuf,
}

impl IdentityStore {
    /// Store under the platform config root.
    pub fn new() -> Result<Self> {
        Self::at(config_root())
    }

    /// Store under an explicit directory.
    pub fn at(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref();
        std::fs::create_dir_all(root)
            .with_context(|| format!("Failed to create {}", root.display()))?;
        Ok(Self {
            path: root.join(IDENTITY_FILE),
        })
    }

    /// Load the persisted identity, if present and well-formed.
    pub fn load(&self) -> Option<CurrentUser> {
        let content = std::fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(user) => Some(user),
            Err(err) => {
                tracing::warn!("Ignoring malformed identity snapshot: {}", err);
                None
            }
        }
    }

    pub fn save(&self, user: &CurrentUser) -> Result<()> {
        let content = serde_json::to_string_pretty(user)?;
        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write {}", self.path.display()))?;
        Ok(())
    }

    pub fn clear(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to remove {}", self.path.display()))?;
        }
        Ok(())
    }
}

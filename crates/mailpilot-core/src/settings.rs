//! Persisted user settings.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::compose::OpenPolicy;
use crate::error::Result;
use crate::model::Sort;
use crate::mutation::OptimisticPolicy;
use crate::ui::ThemeMode;

/// Settings that persist across sessions.
///
/// Missing keys fall back to their defaults, so older files keep loading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Theme.
    pub theme_mode: ThemeMode,
    /// What to do when the backend rejects an optimistic change.
    pub optimistic_policy: OptimisticPolicy,
    /// What to do when composing over an open draft.
    pub open_policy: OpenPolicy,
    /// Sort applied at startup.
    pub default_sort: Sort,
    /// Upper bound on an AI suggestion request, in seconds.
    pub ai_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            theme_mode: ThemeMode::Dark,
            optimistic_policy: OptimisticPolicy::RollbackOnFailure,
            open_policy: OpenPolicy::ConfirmDiscard,
            default_sort: Sort::default(),
            ai_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// File name inside the application's config directory.
    pub const FILE_NAME: &'static str = "settings.json";

    /// Settings path under a config root, e.g. `~/.config/mailpilot/settings.json`.
    #[must_use]
    pub fn path_in(config_dir: &Path) -> PathBuf {
        config_dir.join("mailpilot").join(Self::FILE_NAME)
    }

    /// AI request bound.
    #[must_use]
    pub const fn ai_timeout(&self) -> Duration {
        Duration::from_secs(self.ai_timeout_secs)
    }

    /// Loads settings, returning defaults if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub async fn load(path: &Path) -> Result<Self> {
        if !tokio::fs::try_exists(path).await? {
            return Ok(Self::default());
        }
        let contents = tokio::fs::read_to_string(path).await?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Saves settings as pretty JSON, creating the parent directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory or file cannot be written.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let contents = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, contents).await?;
        info!("Settings saved to {:?}", path);
        Ok(())
    }
}

//! Theme preference and its on-disk persistence.
//!
//! The preference is the only state that survives a restart. Persistence
//! failures are logged and absorbed; the in-memory preference always
//! applies.

use crate::AuraError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemePreference {
    #[default]
    Light,
    Dark,
    System,
}

impl fmt::Display for ThemePreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ThemePreference::Light => "light",
            ThemePreference::Dark => "dark",
            ThemePreference::System => "system",
        };
        write!(f, "{name}")
    }
}

impl FromStr for ThemePreference {
    type Err = AuraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "light" => Ok(ThemePreference::Light),
            "dark" => Ok(ThemePreference::Dark),
            "system" => Ok(ThemePreference::System),
            other => Err(AuraError::Config(format!("Unknown theme preference: {other}"))),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    theme: ThemePreference,
}

/// Reads and writes the persisted theme preference.
pub struct ThemeStore {
    path: PathBuf,
}

impl ThemeStore {
    /// Store backed by the settings file under the user config directory.
    pub fn new() -> Self {
        let base = dirs::config_dir().unwrap_or_else(std::env::temp_dir);
        Self {
            path: base.join("aura").join("settings.toml"),
        }
    }

    /// Store backed by an explicit file path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the saved preference, or the default when there is none or the
    /// file cannot be read.
    pub fn load(&self) -> ThemePreference {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No saved theme preference at {:?}", self.path);
                return ThemePreference::default();
            }
            Err(e) => {
                warn!("Failed to read theme preference from {:?}: {}", self.path, e);
                return ThemePreference::default();
            }
        };

        match toml::from_str::<SettingsFile>(&raw) {
            Ok(settings) => settings.theme,
            Err(e) => {
                warn!("Ignoring malformed settings file {:?}: {}", self.path, e);
                ThemePreference::default()
            }
        }
    }

    /// Persist the preference. Failures are logged, never surfaced.
    pub fn save(&self, theme: ThemePreference) {
        let raw = match toml::to_string(&SettingsFile { theme }) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("Failed to serialize theme preference: {}", e);
                return;
            }
        };

        if let Some(parent) = self.path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                warn!("Failed to create settings directory {:?}: {}", parent, e);
                return;
            }
        }

        if let Err(e) = std::fs::write(&self.path, raw) {
            warn!("Failed to save theme preference to {:?}: {}", self.path, e);
        } else {
            debug!("Saved theme preference: {}", theme);
        }
    }
}

impl Default for ThemeStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn temp_store() -> ThemeStore {
        let path = std::env::temp_dir().join(format!("aura-settings-{}.toml", Uuid::new_v4()));
        ThemeStore::with_path(path)
    }

    #[test]
    fn test_load_without_file_returns_default() {
        let store = temp_store();
        assert_eq!(store.load(), ThemePreference::Light);
    }

    #[test]
    fn test_save_then_load_round_trips() {
        let store = temp_store();
        store.save(ThemePreference::Dark);
        assert_eq!(store.load(), ThemePreference::Dark);
        std::fs::remove_file(store.path()).ok();
    }

    #[test]
    fn test_malformed_file_falls_back_to_default() {
        let store = temp_store();
        std::fs::write(store.path(), "theme = 42").unwrap();
        assert_eq!(store.load(), ThemePreference::Light);
        std::fs::remove_file(store.path()).ok();
    }

    #[test]
    fn test_parse_preference_names() {
        assert_eq!("dark".parse::<ThemePreference>().unwrap(), ThemePreference::Dark);
        assert_eq!(" System ".parse::<ThemePreference>().unwrap(), ThemePreference::System);
        assert!("sepia".parse::<ThemePreference>().is_err());
    }
}

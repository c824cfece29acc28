use crate::error::{ConfigError, Result};
use crate::paths;
use crate::validate::ValidationMode;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// SettingsWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// StoreSettings
// ---------------------------------------------------------------------------

/// Contents of `settings.yaml` in the store root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub validation: ValidationMode,
    /// Whether accessor-driven updates keep a `.bak` copy.
    #[serde(default = "default_backup")]
    pub backup: bool,
    /// Where project note projections are written, relative to the root.
    #[serde(default = "default_notes_dir")]
    pub notes_dir: String,
}

fn default_version() -> u32 {
    1
}

fn default_backup() -> bool {
    true
}

fn default_notes_dir() -> String {
    paths::DEFAULT_NOTES_DIR.to_string()
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            version: default_version(),
            validation: ValidationMode::default(),
            backup: default_backup(),
            notes_dir: default_notes_dir(),
        }
    }
}

impl StoreSettings {
    /// Load `settings.yaml`; a missing file yields the defaults.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::settings_path(root);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        let settings: Self = serde_yaml::from_str(&data).map_err(|e| ConfigError::Parse {
            path,
            message: e.to_string(),
        })?;
        if !paths::is_contained(&settings.notes_dir) {
            return Err(ConfigError::InvalidSetting {
                key: "notes_dir",
                message: format!(
                    "'{}' must be a relative path inside the config root",
                    settings.notes_dir
                ),
            });
        }
        Ok(settings)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::settings_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    pub fn validate(&self) -> Vec<SettingsWarning> {
        let mut warnings = Vec::new();

        if self.version != 1 {
            warnings.push(SettingsWarning {
                level: WarnLevel::Warning,
                message: format!("unknown settings version {}", self.version),
            });
        }

        if !paths::is_contained(&self.notes_dir) {
            warnings.push(SettingsWarning {
                level: WarnLevel::Error,
                message: format!(
                    "notes_dir '{}' must be a relative path inside the config root",
                    self.notes_dir
                ),
            });
        }

        if !self.backup {
            warnings.push(SettingsWarning {
                level: WarnLevel::Warning,
                message: "backups are disabled; failed multi-file changes cannot be restored"
                    .to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

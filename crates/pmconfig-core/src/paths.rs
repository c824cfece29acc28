use crate::error::{ConfigError, Result};
use regex::Regex;
use std::path::{Component, Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory and file constants
// ---------------------------------------------------------------------------

pub const CONFIG_DIR: &str = ".pmconfig";
pub const SETTINGS_FILE: &str = "settings.yaml";

pub const PROJECTS_FILE: &str = "projects.yaml";
pub const TEAM_ROSTER_FILE: &str = "team_roster.yaml";
pub const STAKEHOLDERS_FILE: &str = "stakeholder_contexts.yaml";
pub const INTEGRATIONS_FILE: &str = "integrations.yaml";
pub const DECISION_FRAMEWORKS_FILE: &str = "decision_frameworks.yaml";

pub const DEFAULT_NOTES_DIR: &str = "cache/project_notes";
pub const BACKUP_EXTENSION: &str = "bak";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

/// The config root that sits next to a working tree.
pub fn config_dir(workdir: &Path) -> PathBuf {
    workdir.join(CONFIG_DIR)
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

/// Resolve a document name (e.g. `projects.yaml`) under `root`.
///
/// Absolute names and names that climb out of the root are rejected.
pub fn document_path(root: &Path, name: &str) -> Result<PathBuf> {
    if !is_contained(name) {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(root.join(name))
}

/// True for a non-empty relative path with no `..` or root components.
pub fn is_contained(rel: &str) -> bool {
    !rel.trim().is_empty()
        && Path::new(rel)
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
}

/// `projects.yaml` → `projects.yaml.bak`, in the same directory.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(BACKUP_EXTENSION);
    path.with_file_name(name)
}

/// `<root>/<notes_dir>/<id>.yaml`. Fails if `notes_dir` leaves the root.
pub fn project_note_path(root: &Path, notes_dir: &str, project_id: &str) -> Result<PathBuf> {
    if !is_contained(notes_dir) {
        return Err(ConfigError::InvalidSetting {
            key: "notes_dir",
            message: format!("'{notes_dir}' must be a relative path inside the config root"),
        });
    }
    Ok(root.join(notes_dir).join(format!("{project_id}.yaml")))
}

// ---------------------------------------------------------------------------
// Identifier validation
// ---------------------------------------------------------------------------

static ID_RE: OnceLock<Regex> = OnceLock::new();
static EMAIL_RE: OnceLock<Regex> = OnceLock::new();

fn id_re() -> &'static Regex {
    ID_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9_\-]*$").unwrap())
}

fn email_re() -> &'static Regex {
    EMAIL_RE.get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap())
}

pub fn is_valid_id(id: &str) -> bool {
    id.len() <= 64 && id_re().is_match(id)
}

pub fn is_valid_email(email: &str) -> bool {
    email_re().is_match(email)
}

pub fn validate_id(id: &str) -> Result<()> {
    if !is_valid_id(id) {
        return Err(ConfigError::InvalidId(id.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

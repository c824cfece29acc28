use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// One violated constraint, addressed by a dotted path into the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: String,
    pub message: String,
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.path.is_empty() {
            write!(f, "<document>: {}", self.message)
        } else {
            write!(f, "{}: {}", self.path, self.message)
        }
    }
}

/// Every violation found while validating a document against one schema.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationError {
    pub schema: String,
    pub violations: Vec<Violation>,
}

impl ValidationError {
    /// True if any violation is reported at exactly `path`.
    pub fn has_violation_at(&self, path: &str) -> bool {
        self.violations.iter().any(|v| v.path == path)
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "schema '{}' reported {} violation(s)",
            self.schema,
            self.violations.len()
        )?;
        for v in &self.violations {
            write!(f, "\n  - {v}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    Backup,
    TempWrite,
    Rename,
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            WriteStage::Backup => "backup",
            WriteStage::TempWrite => "temp write",
            WriteStage::Rename => "rename",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub struct WriteError {
    pub path: PathBuf,
    pub stage: WriteStage,
    pub original_preserved: bool,
    #[source]
    pub source: std::io::Error,
}

impl fmt::Display for WriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = if self.original_preserved {
            "original file preserved"
        } else {
            "original file may be affected"
        };
        write!(
            f,
            "write to {} failed during {}: {} ({outcome})",
            self.path.display(),
            self.stage,
            self.source
        )
    }
}

impl WriteError {
    pub fn new(path: impl Into<PathBuf>, stage: WriteStage, source: std::io::Error) -> Self {
        Self {
            path: path.into(),
            stage,
            // Only a failing rename can leave the target in doubt.
            original_preserved: stage != WriteStage::Rename,
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// KnownIds
// ---------------------------------------------------------------------------

const KNOWN_ID_PREVIEW: usize = 5;

/// Short preview of the identifiers a lookup could have matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnownIds {
    pub preview: Vec<String>,
    pub total: usize,
}

impl KnownIds {
    pub fn from_ids<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut all: Vec<String> = ids.into_iter().map(Into::into).collect();
        all.sort();
        let total = all.len();
        all.truncate(KNOWN_ID_PREVIEW);
        Self {
            preview: all,
            total,
        }
    }
}

impl fmt::Display for KnownIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.total == 0 {
            return f.write_str("none defined");
        }
        f.write_str(&self.preview.join(", "))?;
        if self.total > self.preview.len() {
            write!(f, " and {} more", self.total - self.preview.len())?;
        }
        write!(f, "; {} total", self.total)
    }
}

// ---------------------------------------------------------------------------
// ConfigError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config not found: {}", .0.display())]
    ConfigNotFound(PathBuf),

    #[error("project not found: '{id}' (known: {known})")]
    ProjectNotFound { id: String, known: KnownIds },

    #[error("project already exists: {0}")]
    ProjectExists(String),

    #[error("team member not found: '{email}' (known: {known})")]
    TeamMemberNotFound { email: String, known: KnownIds },

    #[error("stakeholder not found: '{email}' (known: {known})")]
    StakeholderNotFound { email: String, known: KnownIds },

    #[error("invalid id '{0}': must be lowercase alphanumeric with '-' or '_'")]
    InvalidId(String),

    #[error("invalid document name '{0}': must be a relative path inside the config root")]
    InvalidName(String),

    #[error("invalid setting {key}: {message}")]
    InvalidSetting { key: &'static str, message: String },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid config {}: {error}", .path.display())]
    Validation {
        path: PathBuf,
        #[source]
        error: ValidationError,
    },

    #[error(transparent)]
    Write(#[from] WriteError),

    #[error("no backup found for {}", .0.display())]
    BackupNotFound(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

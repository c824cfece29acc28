use crate::cache::{CacheStats, ConfigCache, ConfigDocument, FileStamp, Validated};
use crate::entities::{
    Integration, IntegrationsDocument, Project, ProjectsDocument, StakeholderProfile,
    StakeholdersDocument, TeamMember, TeamRosterDocument,
};
use crate::error::{ConfigError, KnownIds, Result, ValidationError, Violation};
use crate::filter::ProjectFilter;
use crate::schema::{Schema, SchemaRegistry};
use crate::settings::StoreSettings;
use crate::validate::{self, type_name};
use crate::{io, merge, paths};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// UpdateOutcome
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub path: PathBuf,
    /// Set when a `.bak` copy of the previous version was written.
    pub backup: Option<PathBuf>,
}

// ---------------------------------------------------------------------------
// ConfigStore
// ---------------------------------------------------------------------------

/// Schema-validated, cached, atomically updated store over a directory of
/// YAML documents.
///
/// The cache belongs to the instance: a new store starts cold, and two
/// stores over the same root never share entries. There is no locking
/// between processes; concurrent writers race and the last rename wins.
#[derive(Debug)]
pub struct ConfigStore {
    root: PathBuf,
    settings: StoreSettings,
    schemas: SchemaRegistry,
    cache: ConfigCache,
}

impl ConfigStore {
    /// Open the store rooted at `root`, reading `settings.yaml` if present.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        let settings = StoreSettings::load(&root)?;
        Ok(Self::with_settings(root, settings))
    }

    pub fn with_settings(root: impl Into<PathBuf>, settings: StoreSettings) -> Self {
        Self {
            root: root.into(),
            settings,
            schemas: SchemaRegistry::builtin(),
            cache: ConfigCache::new(),
        }
    }

    pub fn with_schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = schemas;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.settings
    }

    pub fn schemas(&self) -> &SchemaRegistry {
        &self.schemas
    }

    pub fn path_of(&self, name: &str) -> Result<PathBuf> {
        paths::document_path(&self.root, name)
    }

    // -----------------------------------------------------------------------
    // Loading
    // -----------------------------------------------------------------------

    /// Load a document, optionally validating it against `schema`.
    ///
    /// With `use_cache`, an entry whose file stamp still matches the disk is
    /// returned without reading the file. Validation results are cached
    /// together with the schema and mode that produced them.
    pub fn load(&self, name: &str, schema: Option<&Schema>, use_cache: bool) -> Result<Arc<Value>> {
        let path = self.path_of(name)?;
        let stamp = match stamp_of(&path) {
            Ok(stamp) => stamp,
            Err(e) => {
                if matches!(e, ConfigError::ConfigNotFound(_)) && self.cache.invalidate(&path) {
                    tracing::debug!(name, "cached document removed from disk");
                }
                return Err(e);
            }
        };
        let mode = self.settings.validation;

        if use_cache {
            if let Some(doc) = self.cache.lookup(&path, stamp) {
                tracing::debug!(name, "cache hit");
                let Some(schema) = schema else {
                    return Ok(doc.raw);
                };
                if let Some(value) = doc.validated_for(schema, mode) {
                    return Ok(value);
                }
                let value = Arc::new(self.check(&path, &doc.raw, schema)?);
                let validated = Validated {
                    schema: schema.clone(),
                    mode,
                    value: Arc::clone(&value),
                };
                self.cache.attach_validated(&path, stamp, validated);
                return Ok(value);
            }
        }

        let data = read_document(&path)?;
        self.cache.record_read();
        tracing::debug!(name, bytes = data.len(), "config read from disk");

        let raw = Arc::new(parse_document(&path, &data)?);
        let validated = match schema {
            Some(schema) => Some(Validated {
                schema: schema.clone(),
                mode,
                value: Arc::new(self.check(&path, &raw, schema)?),
            }),
            None => None,
        };
        let result = match &validated {
            Some(v) => Arc::clone(&v.value),
            None => Arc::clone(&raw),
        };
        let document = ConfigDocument {
            raw,
            validated,
            size: data.len() as u64,
        };
        self.cache.insert(path, document, stamp);
        Ok(result)
    }

    /// Load through the cache, validating with the schema registered for
    /// `name` (if any).
    pub fn load_registered(&self, name: &str) -> Result<Arc<Value>> {
        self.load(name, self.schemas.get(name), true)
    }

    /// Load a registered document and decode it into `T`.
    pub fn load_as<T: DeserializeOwned>(&self, name: &str) -> Result<T> {
        let value = self.load_registered(name)?;
        T::deserialize(value.as_ref()).map_err(|e| self.decode_error(name, e))
    }

    fn check(&self, path: &Path, document: &Value, schema: &Schema) -> Result<Value> {
        validate::validate(document, schema, self.settings.validation).map_err(|error| {
            ConfigError::Validation {
                path: path.to_path_buf(),
                error,
            }
        })
    }

    fn decode_error(&self, name: &str, e: serde_yaml::Error) -> ConfigError {
        ConfigError::Parse {
            path: self.root.join(name),
            message: e.to_string(),
        }
    }

    // -----------------------------------------------------------------------
    // Writing
    // -----------------------------------------------------------------------

    /// Deep-merge `updates` into the document on disk and replace it
    /// atomically.
    ///
    /// The current version is read from disk, never from the cache. If the
    /// merged result fails validation the file is not touched. Each call
    /// stands alone: a failure in a later call does not undo earlier ones.
    pub fn update(&self, name: &str, updates: &Value, backup: bool) -> Result<UpdateOutcome> {
        let path = self.path_of(name)?;
        ensure_mapping(&path, updates)?;
        self.commit(name, backup, |current| {
            let mut doc = current.ok_or_else(|| ConfigError::ConfigNotFound(path.clone()))?;
            merge::deep_merge(&mut doc, updates);
            Ok(doc)
        })
    }

    /// Replace a document wholesale, creating it if missing.
    pub fn write(&self, name: &str, document: &Value, backup: bool) -> Result<UpdateOutcome> {
        let path = self.path_of(name)?;
        ensure_mapping(&path, document)?;
        self.commit(name, backup, |_| Ok(document.clone()))
    }

    /// Validate → backup → temp write → rename → evict.
    fn commit<F>(&self, name: &str, backup: bool, mutate: F) -> Result<UpdateOutcome>
    where
        F: FnOnce(Option<Value>) -> Result<Value>,
    {
        let path = self.path_of(name)?;
        let current = match std::fs::read_to_string(&path) {
            Ok(data) => Some(parse_document(&path, &data)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => return Err(e.into()),
        };
        let existed = current.is_some();

        let next = mutate(current)?;
        if let Some(schema) = self.schemas.get(name) {
            self.check(&path, &next, schema)?;
        }
        let data = serde_yaml::to_string(&next)?;

        let backup_path = if backup && existed {
            let b = io::write_backup(&path)?;
            tracing::info!(backup = %b.display(), "config backup written");
            Some(b)
        } else {
            None
        };
        io::atomic_write(&path, data.as_bytes())?;
        self.cache.invalidate(&path);
        tracing::info!(path = %path.display(), "config updated");

        Ok(UpdateOutcome {
            path,
            backup: backup_path,
        })
    }

    /// Put the `.bak` copy of `name` back in place.
    ///
    /// Callers that change several documents as one logical step use this
    /// to compensate when a later step fails.
    pub fn restore_backup(&self, name: &str) -> Result<PathBuf> {
        let path = self.path_of(name)?;
        let backup = paths::backup_path(&path);
        let data = match std::fs::read(&backup) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ConfigError::BackupNotFound(path))
            }
            Err(e) => return Err(e.into()),
        };
        io::atomic_write(&path, &data)?;
        self.cache.invalidate(&path);
        tracing::info!(path = %path.display(), "config restored from backup");
        Ok(path)
    }

    // -----------------------------------------------------------------------
    // Cache control
    // -----------------------------------------------------------------------

    /// Evict one document. Returns true if it was cached.
    pub fn invalidate(&self, name: &str) -> Result<bool> {
        Ok(self.cache.invalidate(&self.path_of(name)?))
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    // -----------------------------------------------------------------------
    // Projects
    // -----------------------------------------------------------------------

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self
            .load_as::<ProjectsDocument>(paths::PROJECTS_FILE)?
            .into_projects())
    }

    pub fn get_project(&self, id: &str) -> Result<Project> {
        let mut projects = self
            .load_as::<ProjectsDocument>(paths::PROJECTS_FILE)?
            .projects;
        match projects.remove(id) {
            Some(mut project) => {
                project.id = id.to_string();
                Ok(project)
            }
            None => Err(ConfigError::ProjectNotFound {
                id: id.to_string(),
                known: KnownIds::from_ids(projects.into_keys()),
            }),
        }
    }

    /// Projects matching `filter`, sorted by id.
    pub fn get_all_projects(&self, filter: &ProjectFilter) -> Result<Vec<Project>> {
        let doc = self.load_registered(paths::PROJECTS_FILE)?;
        let Some(entries) = doc.get("projects").and_then(Value::as_mapping) else {
            return Ok(Vec::new());
        };

        let mut projects = Vec::new();
        for (key, value) in entries {
            let Some(id) = key.as_str() else { continue };
            if !filter.matches(id, value) {
                continue;
            }
            let mut project = Project::deserialize(value)
                .map_err(|e| self.decode_error(paths::PROJECTS_FILE, e))?;
            project.id = id.to_string();
            projects.push(project);
        }
        projects.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(projects)
    }

    /// Partially update an existing project. Unknown ids fail; use
    /// [`ConfigStore::create_project`] to add one.
    pub fn update_project(&self, id: &str, fields: &Value) -> Result<UpdateOutcome> {
        let name = paths::PROJECTS_FILE;
        let path = self.path_of(name)?;
        ensure_mapping(&path, fields)?;
        self.commit(name, self.settings.backup, |current| {
            let mut doc = current.ok_or_else(|| ConfigError::ConfigNotFound(path.clone()))?;
            let known = entry_ids(&doc, "projects");
            if !known.iter().any(|k| k == id) {
                return Err(ConfigError::ProjectNotFound {
                    id: id.to_string(),
                    known: KnownIds::from_ids(known),
                });
            }
            merge::deep_merge(&mut doc, &merge::nest(&["projects", id], fields.clone()));
            Ok(doc)
        })
    }

    /// Replace the stored fields of an existing project with `project`.
    /// Fields left unset on `project` are removed from the file; keys
    /// outside the [`Project`] record are kept.
    pub fn put_project(&self, project: &Project) -> Result<UpdateOutcome> {
        self.update_project(&project.id, &project.to_update())
    }

    /// Add a new project. Creates `projects.yaml` if it does not exist.
    pub fn create_project(&self, project: &Project) -> Result<UpdateOutcome> {
        paths::validate_id(&project.id)?;
        let entry = serde_yaml::to_value(project)?;
        self.commit(paths::PROJECTS_FILE, self.settings.backup, |current| {
            let mut doc = current.unwrap_or_else(|| Value::Mapping(Mapping::new()));
            if entry_ids(&doc, "projects").contains(&project.id) {
                return Err(ConfigError::ProjectExists(project.id.clone()));
            }
            merge::deep_merge(&mut doc, &merge::nest(&["projects", &project.id], entry));
            Ok(doc)
        })
    }

    // -----------------------------------------------------------------------
    // Team roster and stakeholders
    // -----------------------------------------------------------------------

    pub fn list_team_members(&self) -> Result<Vec<TeamMember>> {
        Ok(self
            .load_as::<TeamRosterDocument>(paths::TEAM_ROSTER_FILE)?
            .into_members())
    }

    pub fn get_team_member(&self, email: &str) -> Result<TeamMember> {
        let mut members = self
            .load_as::<TeamRosterDocument>(paths::TEAM_ROSTER_FILE)?
            .team_members;
        match members.remove(email) {
            Some(mut member) => {
                member.email = email.to_string();
                Ok(member)
            }
            None => Err(ConfigError::TeamMemberNotFound {
                email: email.to_string(),
                known: KnownIds::from_ids(members.into_keys()),
            }),
        }
    }

    pub fn list_stakeholders(&self) -> Result<Vec<StakeholderProfile>> {
        Ok(self
            .load_as::<StakeholdersDocument>(paths::STAKEHOLDERS_FILE)?
            .into_stakeholders())
    }

    pub fn get_stakeholder(&self, email: &str) -> Result<StakeholderProfile> {
        let mut stakeholders = self
            .load_as::<StakeholdersDocument>(paths::STAKEHOLDERS_FILE)?
            .stakeholders;
        match stakeholders.remove(email) {
            Some(mut s) => {
                s.email = email.to_string();
                Ok(s)
            }
            None => Err(ConfigError::StakeholderNotFound {
                email: email.to_string(),
                known: KnownIds::from_ids(stakeholders.into_keys()),
            }),
        }
    }

    pub fn list_integrations(&self) -> Result<Vec<Integration>> {
        Ok(self
            .load_as::<IntegrationsDocument>(paths::INTEGRATIONS_FILE)?
            .into_integrations())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn stamp_of(path: &Path) -> Result<FileStamp> {
    FileStamp::of(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::ConfigNotFound(path.to_path_buf()),
        _ => e.into(),
    })
}

fn read_document(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ConfigError::ConfigNotFound(path.to_path_buf()),
        _ => e.into(),
    })
}

/// Parse YAML text into a top-level mapping. An empty document is an empty
/// mapping.
pub(crate) fn parse_document(path: &Path, data: &str) -> Result<Value> {
    if data.trim().is_empty() {
        return Ok(Value::Mapping(Mapping::new()));
    }
    let value: Value = serde_yaml::from_str(data).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    match value {
        Value::Mapping(_) => Ok(value),
        Value::Null => Ok(Value::Mapping(Mapping::new())),
        other => Err(ConfigError::Parse {
            path: path.to_path_buf(),
            message: format!(
                "top-level value must be a mapping, found {}",
                type_name(&other)
            ),
        }),
    }
}

fn ensure_mapping(path: &Path, value: &Value) -> Result<()> {
    if value.is_mapping() {
        return Ok(());
    }
    Err(ConfigError::Validation {
        path: path.to_path_buf(),
        error: ValidationError {
            schema: "document".to_string(),
            violations: vec![Violation {
                path: String::new(),
                message: format!("expected mapping, found {}", type_name(value)),
            }],
        },
    })
}

fn entry_ids(doc: &Value, collection: &str) -> Vec<String> {
    doc.get(collection)
        .and_then(Value::as_mapping)
        .map(|m| {
            m.keys()
                .filter_map(|k| k.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Priority, ProjectStatus};
    use crate::error::WriteStage;
    use crate::schema::{projects_schema, FieldKind, FieldSpec, KeyKind};
    use crate::validate::ValidationMode;
    use chrono::NaiveDate;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const PROJECTS: &str = r#"
projects:
  p1:
    status: active
    priority: high
  p2:
    status: completed
    priority: low
"#;

    const FIXTURE_PROJECTS: &str = r#"
projects:
  alpha:
    status: active
    priority: critical
  beta:
    status: in_progress
    priority: high
    tags: [finance]
  gamma:
    status: completed
    priority: critical
  delta:
    status: on_hold
    priority: low
  epsilon:
    status: in_progress
    priority: critical
    tags: [finance, ops]
  zeta:
    status: planning
"#;

    const ROSTER: &str = r#"
team_members:
  ana@example.com:
    name: Ana Silva
    role: Engineering Manager
    skills: [rust, planning]
  ben@example.com:
    name: Ben Okafor
    role: Analyst
    capacity: 0.5
"#;

    const STAKEHOLDERS: &str = r#"
stakeholders:
  cfo@example.com:
    name: Dana Price
    role: CFO
    influence:
      level: high
      decision_authority: true
"#;

    fn store_with(files: &[(&str, &str)]) -> (TempDir, ConfigStore) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let store = ConfigStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn yaml(s: &str) -> Value {
        serde_yaml::from_str(s).unwrap()
    }

    fn ids(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.id.as_str()).collect()
    }

    fn touch(path: &Path, offset_secs: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        file.set_modified(SystemTime::now() + Duration::from_secs(offset_secs))
            .unwrap();
    }

    // --- load & cache ------------------------------------------------------

    #[test]
    fn second_load_is_served_from_cache() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let first = store.load("projects.yaml", None, true).unwrap();
        let second = store.load("projects.yaml", None, true).unwrap();
        assert_eq!(first, second);
        assert!(Arc::ptr_eq(&first, &second));
        let stats = store.cache_stats();
        assert_eq!(stats.disk_reads, 1);
        assert_eq!(stats.hits, 1);
    }

    #[test]
    fn validated_load_is_cached_too() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let schema = projects_schema();
        let a = store.load("projects.yaml", Some(&schema), true).unwrap();
        let b = store.load("projects.yaml", Some(&schema), true).unwrap();
        assert_eq!(a, b);
        assert_eq!(store.cache_stats().disk_reads, 1);
        // Defaults applied by the schema are visible.
        assert_eq!(a["projects"]["p1"]["tags"], Value::Sequence(vec![]));
    }

    #[test]
    fn cached_raw_document_validates_without_reading() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let raw = store.load("projects.yaml", None, true).unwrap();
        assert!(raw["projects"]["p1"].get("tags").is_none());
        let validated = store.load_registered("projects.yaml").unwrap();
        assert_eq!(validated["projects"]["p1"]["tags"], Value::Sequence(vec![]));
        assert_eq!(store.cache_stats().disk_reads, 1);
    }

    #[test]
    fn bypassing_cache_rereads() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        store.load("projects.yaml", None, true).unwrap();
        store.load("projects.yaml", None, false).unwrap();
        assert_eq!(store.cache_stats().disk_reads, 2);
    }

    #[test]
    fn same_named_schema_is_not_served_from_cache() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        store
            .load("projects.yaml", Some(&projects_schema()), true)
            .unwrap();

        let needs_owner = Schema::new(
            "projects",
            vec![FieldSpec::required(
                "projects",
                FieldKind::map(
                    KeyKind::Slug,
                    FieldKind::Object(vec![FieldSpec::required("owner", FieldKind::String)]),
                ),
            )],
        );
        let err = store
            .load("projects.yaml", Some(&needs_owner), true)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert_eq!(store.cache_stats().disk_reads, 1);
    }

    #[test]
    fn deleted_file_is_not_served_from_cache() {
        let (dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        store.load_registered("projects.yaml").unwrap();
        std::fs::remove_file(dir.path().join("projects.yaml")).unwrap();

        let err = store.load_registered("projects.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound(_)));
        let stats = store.cache_stats();
        assert!(stats.paths.is_empty());
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn external_modification_is_detected() {
        let (dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let before = store.get_project("p1").unwrap();
        assert_eq!(before.status, ProjectStatus::Active);

        let path = dir.path().join("projects.yaml");
        std::fs::write(&path, PROJECTS.replace("status: active", "status: on_hold")).unwrap();
        touch(&path, 5);

        let after = store.get_project("p1").unwrap();
        assert_eq!(after.status, ProjectStatus::OnHold);
        assert_eq!(store.cache_stats().disk_reads, 2);
    }

    #[test]
    fn missing_file_is_not_found() {
        let (dir, store) = store_with(&[]);
        let err = store.load("projects.yaml", None, true).unwrap_err();
        match err {
            ConfigError::ConfigNotFound(path) => {
                assert_eq!(path, dir.path().join("projects.yaml"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn malformed_yaml_is_parse_error_with_path() {
        let (_dir, store) = store_with(&[("projects.yaml", "projects: [unclosed\n")]);
        let err = store.load("projects.yaml", None, true).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("projects.yaml"));
    }

    #[test]
    fn non_mapping_top_level_is_parse_error() {
        let (_dir, store) = store_with(&[("projects.yaml", "- a\n- b\n")]);
        let err = store.load("projects.yaml", None, true).unwrap_err();
        assert!(err.to_string().contains("top-level value must be a mapping"));
    }

    #[test]
    fn empty_file_loads_as_empty_mapping() {
        let (_dir, store) = store_with(&[("decision_frameworks.yaml", "")]);
        let doc = store.load("decision_frameworks.yaml", None, true).unwrap();
        assert_eq!(*doc, Value::Mapping(Mapping::new()));
    }

    #[test]
    fn invalid_document_never_enters_cache() {
        let (_dir, store) = store_with(&[("projects.yaml", "projects:\n  p1:\n    status: done\n")]);
        let err = store.load_registered("projects.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(store.cache_stats().paths.is_empty());
    }

    #[test]
    fn invalid_name_is_rejected() {
        let (_dir, store) = store_with(&[]);
        let err = store.load("../outside.yaml", None, true).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidName(_)));
    }

    #[test]
    fn strict_mode_from_settings() {
        let (dir, _) = store_with(&[(
            "projects.yaml",
            "projects:\n  p1:\n    status: active\n    sprint: 4\n",
        )]);
        let settings = StoreSettings {
            validation: ValidationMode::Strict,
            ..StoreSettings::default()
        };
        let strict = ConfigStore::with_settings(dir.path(), settings);
        let err = strict.load_registered("projects.yaml").unwrap_err();
        assert!(err.to_string().contains("projects.p1.sprint: unknown field"));

        let permissive = ConfigStore::open(dir.path()).unwrap();
        assert!(permissive.load_registered("projects.yaml").is_ok());
    }

    #[test]
    fn clear_cache_forces_reread() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        store.load_registered("projects.yaml").unwrap();
        assert!(store.invalidate("projects.yaml").unwrap());
        store.load_registered("projects.yaml").unwrap();
        store.clear_cache();
        assert!(store.cache_stats().paths.is_empty());
        store.load_registered("projects.yaml").unwrap();
        assert_eq!(store.cache_stats().disk_reads, 3);
    }

    #[test]
    fn stores_do_not_share_caches() {
        let (dir, a) = store_with(&[("projects.yaml", PROJECTS)]);
        a.load_registered("projects.yaml").unwrap();
        let b = ConfigStore::open(dir.path()).unwrap();
        assert!(b.cache_stats().paths.is_empty());
        assert_eq!(a.cache_stats().paths.len(), 1);
    }

    // --- update ------------------------------------------------------------

    #[test]
    fn update_is_visible_on_next_load() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        store.load_registered("projects.yaml").unwrap();
        store
            .update(
                "projects.yaml",
                &yaml("projects:\n  p2:\n    priority: critical\n"),
                true,
            )
            .unwrap();
        let doc = store.load_registered("projects.yaml").unwrap();
        assert_eq!(doc["projects"]["p2"]["priority"], Value::from("critical"));
        assert_eq!(doc["projects"]["p2"]["status"], Value::from("completed"));
    }

    #[test]
    fn failed_validation_leaves_file_untouched() {
        let (dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let path = dir.path().join("projects.yaml");
        let before = std::fs::read(&path).unwrap();

        let err = store
            .update(
                "projects.yaml",
                &yaml("projects:\n  p1:\n    status: exploded\n"),
                true,
            )
            .unwrap_err();
        match &err {
            ConfigError::Validation { error, .. } => {
                assert!(error.has_violation_at("projects.p1.status"))
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read(&path).unwrap(), before);
        assert!(!dir.path().join("projects.yaml.bak").exists());
    }

    #[test]
    fn update_writes_backup_of_previous_version() {
        let (dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let outcome = store
            .update("projects.yaml", &yaml("projects:\n  p1:\n    owner: ana\n"), true)
            .unwrap();
        let backup = outcome.backup.unwrap();
        assert_eq!(backup, dir.path().join("projects.yaml.bak"));
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), PROJECTS);
    }

    #[test]
    fn update_without_backup() {
        let (dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let outcome = store
            .update("projects.yaml", &yaml("projects:\n  p1:\n    owner: ana\n"), false)
            .unwrap();
        assert!(outcome.backup.is_none());
        assert!(!dir.path().join("projects.yaml.bak").exists());
    }

    #[test]
    fn update_missing_file_is_not_found() {
        let (_dir, store) = store_with(&[]);
        let err = store
            .update("projects.yaml", &yaml("projects: {}"), true)
            .unwrap_err();
        assert!(matches!(err, ConfigError::ConfigNotFound(_)));
    }

    #[test]
    fn update_rejects_non_mapping() {
        let (dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let err = store
            .update("projects.yaml", &Value::from("oops"), true)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("projects.yaml")).unwrap(),
            PROJECTS
        );
    }

    #[test]
    fn update_of_unregistered_document_skips_validation() {
        let (_dir, store) = store_with(&[("decision_frameworks.yaml", "raci: {}\n")]);
        store
            .update(
                "decision_frameworks.yaml",
                &yaml("rice:\n  weights: [1, 2]\n"),
                false,
            )
            .unwrap();
        let doc = store.load("decision_frameworks.yaml", None, true).unwrap();
        assert!(doc.get("raci").is_some());
        assert!(doc.get("rice").is_some());
    }

    #[test]
    fn write_creates_document() {
        let (dir, store) = store_with(&[]);
        let outcome = store
            .write("integrations.yaml", &yaml("integrations: {}"), true)
            .unwrap();
        assert!(outcome.backup.is_none());
        assert!(dir.path().join("integrations.yaml").exists());
        assert!(store.list_integrations().unwrap().is_empty());
    }

    #[test]
    fn restore_backup_reverts_last_update() {
        let (dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        store
            .update_project("p1", &yaml("status: cancelled"))
            .unwrap();
        assert_eq!(
            store.get_project("p1").unwrap().status,
            ProjectStatus::Cancelled
        );
        store.restore_backup("projects.yaml").unwrap();
        assert_eq!(
            store.get_project("p1").unwrap().status,
            ProjectStatus::Active
        );
        assert_eq!(
            std::fs::read_to_string(dir.path().join("projects.yaml")).unwrap(),
            PROJECTS
        );
    }

    #[test]
    fn restore_without_backup_fails() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let err = store.restore_backup("projects.yaml").unwrap_err();
        assert!(matches!(err, ConfigError::BackupNotFound(_)));
    }

    #[cfg(unix)]
    #[test]
    fn write_failure_reports_stage_and_preserves_original() {
        use std::os::unix::fs::PermissionsExt;

        let (dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let path = dir.path().join("projects.yaml");
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o555)).unwrap();

        // Root ignores directory permissions; nothing to observe then.
        let canary = dir.path().join(".canary");
        if std::fs::write(&canary, b"x").is_ok() {
            std::fs::remove_file(&canary).unwrap();
            std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755))
                .unwrap();
            return;
        }

        let err = store
            .update("projects.yaml", &yaml("projects:\n  p1:\n    owner: ana\n"), false)
            .unwrap_err();
        std::fs::set_permissions(dir.path(), std::fs::Permissions::from_mode(0o755)).unwrap();
        match err {
            ConfigError::Write(w) => {
                assert_eq!(w.stage, WriteStage::TempWrite);
                assert!(w.original_preserved);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(std::fs::read_to_string(&path).unwrap(), PROJECTS);
    }

    // --- projects ----------------------------------------------------------

    #[test]
    fn filter_by_status_returns_exact_set() {
        let (_dir, store) = store_with(&[("projects.yaml", FIXTURE_PROJECTS)]);
        let filter = ProjectFilter::new().with("status", ["active", "in_progress"]);
        let projects = store.get_all_projects(&filter).unwrap();
        assert_eq!(ids(&projects), vec!["alpha", "beta", "epsilon"]);
        assert!(projects.iter().all(|p| p.status.is_open()));
    }

    #[test]
    fn filter_and_across_fields() {
        let (_dir, store) = store_with(&[("projects.yaml", FIXTURE_PROJECTS)]);
        let filter = ProjectFilter::new()
            .with("status", ["active", "in_progress"])
            .with("priority", ["critical"]);
        let projects = store.get_all_projects(&filter).unwrap();
        assert_eq!(ids(&projects), vec!["alpha", "epsilon"]);
    }

    #[test]
    fn filter_sees_schema_defaults() {
        let (_dir, store) = store_with(&[("projects.yaml", FIXTURE_PROJECTS)]);
        let filter = ProjectFilter::new().with("priority", ["medium"]);
        let projects = store.get_all_projects(&filter).unwrap();
        assert_eq!(ids(&projects), vec!["zeta"]);
    }

    #[test]
    fn empty_filter_returns_all() {
        let (_dir, store) = store_with(&[("projects.yaml", FIXTURE_PROJECTS)]);
        let projects = store.get_all_projects(&ProjectFilter::new()).unwrap();
        assert_eq!(projects.len(), 6);
        assert_eq!(store.list_projects().unwrap().len(), 6);
    }

    #[test]
    fn example_filter_scenario() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let filter = ProjectFilter::new().with("status", ["active"]);
        let projects = store.get_all_projects(&filter).unwrap();
        let mut expected = Project::new("p1", ProjectStatus::Active);
        expected.priority = Priority::High;
        assert_eq!(projects, vec![expected]);
    }

    #[test]
    fn partial_update_preserves_untouched_fields() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        store
            .update_project("p1", &yaml("status: completed"))
            .unwrap();
        let p1 = store.get_project("p1").unwrap();
        assert_eq!(p1.status, ProjectStatus::Completed);
        assert_eq!(p1.priority, Priority::High);
    }

    #[test]
    fn project_round_trip() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let project = Project {
            id: "p1".to_string(),
            name: Some("Q3 Budget Review".to_string()),
            status: ProjectStatus::InProgress,
            priority: Priority::Critical,
            owner: Some("ana@example.com".to_string()),
            start_date: NaiveDate::from_ymd_opt(2026, 7, 1),
            target_date: NaiveDate::from_ymd_opt(2026, 9, 30),
            team: vec!["ana@example.com".to_string(), "ben@example.com".to_string()],
            budget: Some(125_000.5),
            tags: vec!["finance".to_string()],
            description: Some("Quarterly variance analysis".to_string()),
        };
        store.put_project(&project).unwrap();
        assert_eq!(store.get_project("p1").unwrap(), project);
    }

    #[test]
    fn put_project_clears_removed_fields() {
        let stored = r#"
projects:
  p1:
    name: Old Name
    status: active
    priority: high
    owner: ana@example.com
    budget: 5000
    tags: [finance, ops]
    team: [ana@example.com]
"#;
        let (_dir, store) = store_with(&[("projects.yaml", stored)]);
        let mut project = store.get_project("p1").unwrap();
        project.name = None;
        project.owner = None;
        project.budget = None;
        project.tags.clear();
        project.status = ProjectStatus::Completed;

        store.put_project(&project).unwrap();
        let reread = store.get_project("p1").unwrap();
        assert_eq!(reread, project);
        assert_eq!(reread.team, vec!["ana@example.com"]);

        let raw = store.load("projects.yaml", None, false).unwrap();
        let entry = &raw["projects"]["p1"];
        for gone in ["name", "owner", "budget"] {
            assert!(entry.get(gone).is_none(), "{gone} still stored");
        }
    }

    #[test]
    fn update_unknown_project_fails_without_writing() {
        let (dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let err = store
            .update_project("p9", &yaml("status: active"))
            .unwrap_err();
        match &err {
            ConfigError::ProjectNotFound { id, known } => {
                assert_eq!(id, "p9");
                assert_eq!(known.preview, vec!["p1", "p2"]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(
            std::fs::read_to_string(dir.path().join("projects.yaml")).unwrap(),
            PROJECTS
        );
    }

    #[test]
    fn get_unknown_project_lists_known_ids() {
        let (_dir, store) = store_with(&[("projects.yaml", PROJECTS)]);
        let err = store.get_project("nope").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'nope'"), "{msg}");
        assert!(msg.contains("p1, p2; 2 total"), "{msg}");
    }

    #[test]
    fn create_project_then_duplicate_fails() {
        let (_dir, store) = store_with(&[]);
        let mut project = Project::new("launch", ProjectStatus::Planning);
        project.name = Some("Product launch".to_string());
        store.create_project(&project).unwrap();
        assert_eq!(store.get_project("launch").unwrap(), project);

        let err = store.create_project(&project).unwrap_err();
        assert!(matches!(err, ConfigError::ProjectExists(id) if id == "launch"));
    }

    #[test]
    fn create_project_rejects_bad_id() {
        let (_dir, store) = store_with(&[]);
        let project = Project::new("Bad Id", ProjectStatus::Planning);
        let err = store.create_project(&project).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidId(_)));
    }

    // --- team & stakeholders -----------------------------------------------

    #[test]
    fn team_member_lookup() {
        let (_dir, store) = store_with(&[("team_roster.yaml", ROSTER)]);
        let ben = store.get_team_member("ben@example.com").unwrap();
        assert_eq!(ben.name, "Ben Okafor");
        assert_eq!(ben.capacity, 0.5);
        let ana = store.get_team_member("ana@example.com").unwrap();
        assert_eq!(ana.capacity, 1.0);
        assert_eq!(ana.skills, vec!["rust", "planning"]);

        let err = store.get_team_member("zed@example.com").unwrap_err();
        assert!(matches!(err, ConfigError::TeamMemberNotFound { .. }));
        assert!(err.to_string().contains("ana@example.com"));
    }

    #[test]
    fn stakeholder_lookup() {
        let (_dir, store) = store_with(&[("stakeholder_contexts.yaml", STAKEHOLDERS)]);
        let cfo = store.get_stakeholder("cfo@example.com").unwrap();
        assert_eq!(cfo.role, "CFO");
        assert!(cfo.influence.decision_authority);
        assert_eq!(store.list_stakeholders().unwrap().len(), 1);

        let err = store.get_stakeholder("ceo@example.com").unwrap_err();
        assert!(matches!(err, ConfigError::StakeholderNotFound { .. }));
    }
}

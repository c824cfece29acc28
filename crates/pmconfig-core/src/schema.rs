//! Declarative document schemas.
//!
//! A [`Schema`] describes the shape of one YAML document: required and
//! optional fields, their kinds, enumerated values and defaults. Schemas are
//! plain data so callers can register their own next to the built-in ones.

use crate::entities::{
    Channel, DetailLevel, Frequency, InfluenceLevel, Priority, ProjectStatus,
};
use crate::paths;
use serde_yaml::{Mapping, Value};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Kinds
// ---------------------------------------------------------------------------

/// Constraint on the keys of a [`FieldKind::Map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Lowercase alphanumeric with `-` or `_`.
    Slug,
    Email,
    Any,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    /// Number in `0.0..=1.0`.
    Ratio,
    Bool,
    /// ISO `YYYY-MM-DD`.
    Date,
    Email,
    Enum(&'static [&'static str]),
    List(Box<FieldKind>),
    Object(Vec<FieldSpec>),
    Map { key: KeyKind, value: Box<FieldKind> },
    Any,
}

impl FieldKind {
    pub fn list(inner: FieldKind) -> Self {
        FieldKind::List(Box::new(inner))
    }

    pub fn map(key: KeyKind, value: FieldKind) -> Self {
        FieldKind::Map {
            key,
            value: Box::new(value),
        }
    }
}

// ---------------------------------------------------------------------------
// FieldSpec
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
    /// Applied when an optional field is absent or null.
    pub default: Option<Value>,
}

impl FieldSpec {
    pub fn required(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: true,
            default: None,
        }
    }

    pub fn optional(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
        }
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }
}

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub name: String,
    pub fields: Vec<FieldSpec>,
}

impl Schema {
    pub fn new(name: impl Into<String>, fields: Vec<FieldSpec>) -> Self {
        Self {
            name: name.into(),
            fields,
        }
    }
}

fn empty_map() -> Value {
    Value::Mapping(Mapping::new())
}

fn empty_list() -> Value {
    Value::Sequence(Vec::new())
}

pub fn projects_schema() -> Schema {
    let project = vec![
        FieldSpec::optional("name", FieldKind::String),
        FieldSpec::required("status", FieldKind::Enum(ProjectStatus::NAMES)),
        FieldSpec::optional("priority", FieldKind::Enum(Priority::NAMES)).with_default("medium"),
        FieldSpec::optional("owner", FieldKind::String),
        FieldSpec::optional("start_date", FieldKind::Date),
        FieldSpec::optional("target_date", FieldKind::Date),
        FieldSpec::optional("team", FieldKind::list(FieldKind::Email)).with_default(empty_list()),
        FieldSpec::optional("budget", FieldKind::Number),
        FieldSpec::optional("tags", FieldKind::list(FieldKind::String)).with_default(empty_list()),
        FieldSpec::optional("description", FieldKind::String),
    ];
    Schema::new(
        "projects",
        vec![FieldSpec::optional(
            "projects",
            FieldKind::map(KeyKind::Slug, FieldKind::Object(project)),
        )
        .with_default(empty_map())],
    )
}

pub fn team_roster_schema() -> Schema {
    let member = vec![
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("role", FieldKind::String),
        FieldSpec::optional("department", FieldKind::String),
        FieldSpec::optional("manager", FieldKind::Email),
        FieldSpec::optional("start_date", FieldKind::Date),
        FieldSpec::optional("skills", FieldKind::list(FieldKind::String)).with_default(empty_list()),
        FieldSpec::optional("capacity", FieldKind::Ratio).with_default(1.0),
    ];
    Schema::new(
        "team_roster",
        vec![FieldSpec::optional(
            "team_members",
            FieldKind::map(KeyKind::Email, FieldKind::Object(member)),
        )
        .with_default(empty_map())],
    )
}

pub fn stakeholders_schema() -> Schema {
    let influence = vec![
        FieldSpec::optional("level", FieldKind::Enum(InfluenceLevel::NAMES)).with_default("medium"),
        FieldSpec::optional("decision_authority", FieldKind::Bool).with_default(false),
        FieldSpec::optional("interests", FieldKind::list(FieldKind::String))
            .with_default(empty_list()),
    ];
    let preferences = vec![
        FieldSpec::optional("channel", FieldKind::Enum(Channel::NAMES)).with_default("email"),
        FieldSpec::optional("frequency", FieldKind::Enum(Frequency::NAMES)).with_default("weekly"),
        FieldSpec::optional("detail_level", FieldKind::Enum(DetailLevel::NAMES))
            .with_default("summary"),
    ];
    let stakeholder = vec![
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("role", FieldKind::String),
        FieldSpec::optional("organization", FieldKind::String),
        FieldSpec::optional("influence", FieldKind::Object(influence)).with_default(empty_map()),
        FieldSpec::optional("preferences", FieldKind::Object(preferences))
            .with_default(empty_map()),
        FieldSpec::optional("concerns", FieldKind::list(FieldKind::String))
            .with_default(empty_list()),
        FieldSpec::optional("last_contact", FieldKind::Date),
    ];
    Schema::new(
        "stakeholder_contexts",
        vec![FieldSpec::optional(
            "stakeholders",
            FieldKind::map(KeyKind::Email, FieldKind::Object(stakeholder)),
        )
        .with_default(empty_map())],
    )
}

pub fn integrations_schema() -> Schema {
    let integration = vec![
        FieldSpec::optional("enabled", FieldKind::Bool).with_default(false),
        FieldSpec::optional("kind", FieldKind::String),
    ];
    Schema::new(
        "integrations",
        vec![FieldSpec::optional(
            "integrations",
            FieldKind::map(KeyKind::Slug, FieldKind::Object(integration)),
        )
        .with_default(empty_map())],
    )
}

// ---------------------------------------------------------------------------
// SchemaRegistry
// ---------------------------------------------------------------------------

/// Schemas keyed by document file name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Schema>,
}

impl SchemaRegistry {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        registry.register(paths::PROJECTS_FILE, projects_schema());
        registry.register(paths::TEAM_ROSTER_FILE, team_roster_schema());
        registry.register(paths::STAKEHOLDERS_FILE, stakeholders_schema());
        registry.register(paths::INTEGRATIONS_FILE, integrations_schema());
        registry
    }

    /// Register (or replace) the schema for `file_name`.
    pub fn register(&mut self, file_name: impl Into<String>, schema: Schema) {
        self.schemas.insert(file_name.into(), schema);
    }

    pub fn get(&self, file_name: &str) -> Option<&Schema> {
        self.schemas.get(file_name)
    }

    /// Registered file names, sorted.
    pub fn file_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

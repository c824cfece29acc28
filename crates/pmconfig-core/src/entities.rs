use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ProjectStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Planning,
    Active,
    InProgress,
    OnHold,
    Completed,
    Cancelled,
}

impl ProjectStatus {
    pub const NAMES: &'static [&'static str] = &[
        "planning",
        "active",
        "in_progress",
        "on_hold",
        "completed",
        "cancelled",
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ProjectStatus::Planning => "planning",
            ProjectStatus::Active => "active",
            ProjectStatus::InProgress => "in_progress",
            ProjectStatus::OnHold => "on_hold",
            ProjectStatus::Completed => "completed",
            ProjectStatus::Cancelled => "cancelled",
        }
    }

    /// Active or in progress.
    pub fn is_open(self) -> bool {
        matches!(self, ProjectStatus::Active | ProjectStatus::InProgress)
    }
}

impl fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Critical,
    High,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub const NAMES: &'static [&'static str] = &["critical", "high", "medium", "low"];

    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Critical => "critical",
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Project
// ---------------------------------------------------------------------------

/// One entry of `projects.yaml`. The id is the map key, not a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    #[serde(skip)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub status: ProjectStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    /// Team member emails. Weak references into the roster.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Project {
    pub fn new(id: impl Into<String>, status: ProjectStatus) -> Self {
        Self {
            id: id.into(),
            name: None,
            status,
            priority: Priority::default(),
            owner: None,
            start_date: None,
            target_date: None,
            team: Vec::new(),
            budget: None,
            tags: Vec::new(),
            description: None,
        }
    }

    /// Display name, falling back to the id.
    pub fn title(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    /// Every field as a merge update. Unset options become `null` and
    /// empty lists stay `[]`, so merging this over a stored entry leaves
    /// none of its old values behind.
    pub fn to_update(&self) -> Value {
        fn opt(v: Option<&str>) -> Value {
            v.map_or(Value::Null, Value::from)
        }
        fn list(items: &[String]) -> Value {
            Value::Sequence(items.iter().map(|s| Value::from(s.as_str())).collect())
        }

        let mut m = Mapping::new();
        m.insert("name".into(), opt(self.name.as_deref()));
        m.insert("status".into(), self.status.as_str().into());
        m.insert("priority".into(), self.priority.as_str().into());
        m.insert("owner".into(), opt(self.owner.as_deref()));
        m.insert(
            "start_date".into(),
            opt(self.start_date.map(|d| d.to_string()).as_deref()),
        );
        m.insert(
            "target_date".into(),
            opt(self.target_date.map(|d| d.to_string()).as_deref()),
        );
        m.insert("team".into(), list(&self.team));
        m.insert("budget".into(), self.budget.map_or(Value::Null, Value::from));
        m.insert("tags".into(), list(&self.tags));
        m.insert("description".into(), opt(self.description.as_deref()));
        Value::Mapping(m)
    }
}

// ---------------------------------------------------------------------------
// TeamMember
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(skip)]
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manager: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    /// Fraction of full time, 0.0..=1.0.
    #[serde(default = "default_capacity")]
    pub capacity: f64,
}

fn default_capacity() -> f64 {
    1.0
}

// ---------------------------------------------------------------------------
// Stakeholder profile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InfluenceLevel {
    High,
    #[default]
    Medium,
    Low,
}

impl InfluenceLevel {
    pub const NAMES: &'static [&'static str] = &["high", "medium", "low"];

    pub fn as_str(self) -> &'static str {
        match self {
            InfluenceLevel::High => "high",
            InfluenceLevel::Medium => "medium",
            InfluenceLevel::Low => "low",
        }
    }
}

impl fmt::Display for InfluenceLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    #[default]
    Email,
    Slack,
    Meeting,
    Phone,
}

impl Channel {
    pub const NAMES: &'static [&'static str] = &["email", "slack", "meeting", "phone"];

    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Email => "email",
            Channel::Slack => "slack",
            Channel::Meeting => "meeting",
            Channel::Phone => "phone",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    #[default]
    Weekly,
    Biweekly,
    Monthly,
}

impl Frequency {
    pub const NAMES: &'static [&'static str] = &["daily", "weekly", "biweekly", "monthly"];

    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    #[default]
    Summary,
    Detailed,
}

impl DetailLevel {
    pub const NAMES: &'static [&'static str] = &["summary", "detailed"];

    pub fn as_str(self) -> &'static str {
        match self {
            DetailLevel::Summary => "summary",
            DetailLevel::Detailed => "detailed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InfluenceFactors {
    #[serde(default)]
    pub level: InfluenceLevel,
    #[serde(default)]
    pub decision_authority: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interests: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommunicationPreferences {
    #[serde(default)]
    pub channel: Channel,
    #[serde(default)]
    pub frequency: Frequency,
    #[serde(default)]
    pub detail_level: DetailLevel,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StakeholderProfile {
    #[serde(skip)]
    pub email: String,
    pub name: String,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(default)]
    pub influence: InfluenceFactors,
    #[serde(default)]
    pub preferences: CommunicationPreferences,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub concerns: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_contact: Option<NaiveDate>,
}

// ---------------------------------------------------------------------------
// Integration
// ---------------------------------------------------------------------------

/// One entry of `integrations.yaml`. Settings beyond `enabled`/`kind`
/// are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Integration {
    #[serde(skip)]
    pub name: String,
    #[serde(default)]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(flatten)]
    pub settings: BTreeMap<String, Value>,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProjectsDocument {
    #[serde(default)]
    pub projects: BTreeMap<String, Project>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TeamRosterDocument {
    #[serde(default)]
    pub team_members: BTreeMap<String, TeamMember>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StakeholdersDocument {
    #[serde(default)]
    pub stakeholders: BTreeMap<String, StakeholderProfile>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IntegrationsDocument {
    #[serde(default)]
    pub integrations: BTreeMap<String, Integration>,
}

impl ProjectsDocument {
    /// Projects in id order, with ids filled in from the map keys.
    pub fn into_projects(self) -> Vec<Project> {
        self.projects
            .into_iter()
            .map(|(id, mut p)| {
                p.id = id;
                p
            })
            .collect()
    }
}

impl TeamRosterDocument {
    pub fn into_members(self) -> Vec<TeamMember> {
        self.team_members
            .into_iter()
            .map(|(email, mut m)| {
                m.email = email;
                m
            })
            .collect()
    }
}

impl StakeholdersDocument {
    pub fn into_stakeholders(self) -> Vec<StakeholderProfile> {
        self.stakeholders
            .into_iter()
            .map(|(email, mut s)| {
                s.email = email;
                s
            })
            .collect()
    }
}

impl IntegrationsDocument {
    pub fn into_integrations(self) -> Vec<Integration> {
        self.integrations
            .into_iter()
            .map(|(name, mut i)| {
                i.name = name;
                i
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Cross-file synchronization.
//!
//! Both directions here are one-way projections: the roster feeds
//! stakeholder names and roles, and a project feeds its notes file. A
//! failure loading or validating a source aborts before the target is
//! touched.

use crate::entities::{Priority, Project, ProjectStatus, TeamMember};
use crate::error::{ConfigError, Result};
use crate::store::{ConfigStore, UpdateOutcome};
use crate::{io, paths};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Stakeholder emails whose name or role changed.
    pub updated: Vec<String>,
    pub unchanged: Vec<String>,
    /// Roster emails with no stakeholder record.
    pub skipped: Vec<String>,
    #[serde(skip)]
    pub outcome: Option<UpdateOutcome>,
}

impl SyncReport {
    pub fn wrote(&self) -> bool {
        self.outcome.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteOutcome {
    pub path: PathBuf,
    /// False when the file already held identical content.
    pub written: bool,
}

// ---------------------------------------------------------------------------
// ProjectNote
// ---------------------------------------------------------------------------

/// Contents of `<notes_dir>/<id>.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectNote {
    pub project_id: String,
    pub title: String,
    pub status: ProjectStatus,
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub team: Vec<NoteMember>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteMember {
    pub email: String,
    /// Absent when the email is not on the roster.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl ProjectNote {
    pub fn build(project: &Project, roster: &[TeamMember]) -> Self {
        let team = project
            .team
            .iter()
            .map(|email| {
                let member = roster.iter().find(|m| &m.email == email);
                NoteMember {
                    email: email.clone(),
                    name: member.map(|m| m.name.clone()),
                    role: member.map(|m| m.role.clone()),
                }
            })
            .collect();
        Self {
            project_id: project.id.clone(),
            title: project.title().to_string(),
            status: project.status,
            priority: project.priority,
            owner: project.owner.clone(),
            start_date: project.start_date,
            target_date: project.target_date,
            budget: project.budget,
            tags: project.tags.clone(),
            team,
            description: project.description.clone(),
        }
    }
}

// ---------------------------------------------------------------------------
// Sync operations
// ---------------------------------------------------------------------------

impl ConfigStore {
    /// Copy name and role from each roster member onto the stakeholder
    /// with the same email. Email matching is exact.
    pub fn sync_team_to_stakeholders(&self) -> Result<SyncReport> {
        let members = self.list_team_members()?;
        let stakeholders = self.list_stakeholders()?;

        let mut report = SyncReport::default();
        let mut changes = Mapping::new();
        for member in &members {
            let Some(s) = stakeholders.iter().find(|s| s.email == member.email) else {
                tracing::warn!(email = %member.email, "no stakeholder record for team member");
                report.skipped.push(member.email.clone());
                continue;
            };
            if s.name == member.name && s.role == member.role {
                report.unchanged.push(member.email.clone());
                continue;
            }
            let mut fields = Mapping::new();
            fields.insert(Value::from("name"), Value::from(member.name.as_str()));
            fields.insert(Value::from("role"), Value::from(member.role.as_str()));
            changes.insert(Value::from(member.email.as_str()), Value::Mapping(fields));
            report.updated.push(member.email.clone());
        }

        if !changes.is_empty() {
            let mut updates = Mapping::new();
            updates.insert(Value::from("stakeholders"), Value::Mapping(changes));
            let outcome = self.update(
                paths::STAKEHOLDERS_FILE,
                &Value::Mapping(updates),
                self.settings().backup,
            )?;
            report.outcome = Some(outcome);
        }
        tracing::info!(
            updated = report.updated.len(),
            unchanged = report.unchanged.len(),
            skipped = report.skipped.len(),
            "team synced to stakeholders"
        );
        Ok(report)
    }

    /// Write the notes projection for one project.
    ///
    /// Output is deterministic; the file is left alone when its content
    /// would not change. A missing roster leaves member names unresolved.
    pub fn sync_project_to_notes(&self, project_id: &str) -> Result<NoteOutcome> {
        paths::validate_id(project_id)?;
        let path = paths::project_note_path(self.root(), &self.settings().notes_dir, project_id)?;
        let project = self.get_project(project_id)?;
        let roster = match self.list_team_members() {
            Ok(members) => members,
            Err(ConfigError::ConfigNotFound(_)) => Vec::new(),
            Err(e) => return Err(e),
        };

        let note = ProjectNote::build(&project, &roster);
        let data = serde_yaml::to_string(&note)?;
        let written = io::write_if_changed(&path, data.as_bytes())?;
        if written {
            tracing::info!(path = %path.display(), "project note written");
        } else {
            tracing::debug!(path = %path.display(), "project note unchanged");
        }
        Ok(NoteOutcome { path, written })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

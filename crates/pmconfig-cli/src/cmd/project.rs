use crate::cmd::{open_store, parse_yaml};
use crate::output::{cell, print_json, print_table};
use anyhow::Context;
use chrono::NaiveDate;
use clap::Subcommand;
use pmconfig_core::entities::{Priority, Project, ProjectStatus};
use pmconfig_core::ProjectFilter;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum ProjectSubcommand {
    /// List projects, optionally filtered
    List {
        /// Allowed statuses (comma-separated or repeated)
        #[arg(long, value_delimiter = ',')]
        status: Vec<String>,
        /// Allowed priorities
        #[arg(long, value_delimiter = ',')]
        priority: Vec<String>,
        /// Projects carrying any of these tags
        #[arg(long, value_delimiter = ',')]
        tag: Vec<String>,
        #[arg(long)]
        owner: Option<String>,
    },

    /// Show one project
    Show { id: String },

    /// Create a new project
    Create {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, default_value = "planning")]
        status: String,
        #[arg(long, default_value = "medium")]
        priority: String,
        #[arg(long)]
        owner: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        target_date: Option<NaiveDate>,
    },

    /// Update fields of an existing project
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        owner: Option<String>,
        /// YYYY-MM-DD
        #[arg(long)]
        target_date: Option<NaiveDate>,
        /// Extra fields as a YAML mapping, e.g. '{budget: 5000, owner: null}'
        #[arg(long)]
        set: Option<String>,
    },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: ProjectSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ProjectSubcommand::List {
            status,
            priority,
            tag,
            owner,
        } => {
            let filter: ProjectFilter = [
                ("status", status),
                ("priority", priority),
                ("tags", tag),
                ("owner", owner.into_iter().collect()),
            ]
            .into_iter()
            .filter(|(_, allowed)| !allowed.is_empty())
            .collect();
            list(root, &filter, json)
        }
        ProjectSubcommand::Show { id } => show(root, &id, json),
        ProjectSubcommand::Create {
            id,
            name,
            status,
            priority,
            owner,
            target_date,
        } => {
            let mut project = Project::new(id, parse_enum::<ProjectStatus>("status", &status)?);
            project.name = name;
            project.priority = parse_enum::<Priority>("priority", &priority)?;
            project.owner = owner;
            project.target_date = target_date;
            create(root, &project, json)
        }
        ProjectSubcommand::Update {
            id,
            name,
            status,
            priority,
            owner,
            target_date,
            set,
        } => {
            let mut fields = match set {
                Some(text) => match parse_yaml(&text)? {
                    Value::Mapping(m) => m,
                    other => anyhow::bail!("--set must be a YAML mapping, got: {other:?}"),
                },
                None => Mapping::new(),
            };
            let flags = [
                ("name", name),
                ("status", status),
                ("priority", priority),
                ("owner", owner),
                ("target_date", target_date.map(|d| d.to_string())),
            ];
            for (key, value) in flags {
                if let Some(v) = value {
                    fields.insert(Value::from(key), Value::from(v));
                }
            }
            if fields.is_empty() {
                anyhow::bail!("nothing to update: pass at least one field flag or --set");
            }
            update(root, &id, &Value::Mapping(fields), json)
        }
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

fn list(root: &Path, filter: &ProjectFilter, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let projects = store
        .get_all_projects(filter)
        .context("failed to list projects")?;

    if json {
        let keyed: BTreeMap<&str, &Project> =
            projects.iter().map(|p| (p.id.as_str(), p)).collect();
        return print_json(&keyed);
    }

    let rows = projects
        .iter()
        .map(|p| {
            vec![
                p.id.clone(),
                p.status.to_string(),
                p.priority.to_string(),
                cell(p.owner.as_deref()),
                cell(p.target_date),
                p.title().to_string(),
            ]
        })
        .collect();
    print_table(&["ID", "STATUS", "PRIORITY", "OWNER", "TARGET", "NAME"], rows);
    Ok(())
}

// ---------------------------------------------------------------------------
// show
// ---------------------------------------------------------------------------

fn show(root: &Path, id: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let project = store.get_project(id)?;

    if json {
        let mut value = serde_json::to_value(&project)?;
        if let Some(obj) = value.as_object_mut() {
            obj.insert("id".to_string(), serde_json::Value::from(project.id.clone()));
        }
        return print_json(&value);
    }

    println!("Project: {} ({})", project.title(), project.id);
    println!("Status:   {}", project.status);
    println!("Priority: {}", project.priority);
    println!("Owner:    {}", cell(project.owner.as_deref()));
    println!(
        "Dates:    {} → {}",
        cell(project.start_date),
        cell(project.target_date)
    );
    if let Some(budget) = project.budget {
        println!("Budget:   {budget}");
    }
    if !project.tags.is_empty() {
        println!("Tags:     {}", project.tags.join(", "));
    }
    if !project.team.is_empty() {
        println!("\nTeam:");
        for email in &project.team {
            println!("  {email}");
        }
    }
    if let Some(desc) = &project.description {
        println!("\n{desc}");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// create / update
// ---------------------------------------------------------------------------

fn create(root: &Path, project: &Project, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let outcome = store.create_project(project)?;

    if json {
        print_json(&serde_json::json!({ "created": project.id, "path": outcome.path }))?;
    } else {
        println!("Created project: {}", project.id);
    }
    Ok(())
}

fn update(root: &Path, id: &str, fields: &Value, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let outcome = store.update_project(id, fields)?;
    let project = store.get_project(id)?;

    if json {
        print_json(&serde_json::json!({
            "updated": id,
            "status": project.status,
            "priority": project.priority,
            "backup": outcome.backup,
        }))?;
    } else {
        println!(
            "Updated project: {} [{} / {}]",
            id, project.status, project.priority
        );
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn parse_enum<T: DeserializeOwned>(field: &str, text: &str) -> anyhow::Result<T> {
    serde_yaml::from_value(Value::from(text))
        .with_context(|| format!("invalid {field} '{text}'"))
}

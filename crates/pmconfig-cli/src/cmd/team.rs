use crate::cmd::open_store;
use crate::output::{cell, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use pmconfig_core::entities::TeamMember;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Subcommand)]
pub enum TeamSubcommand {
    /// List the team roster
    List,
    /// Show one team member
    Show { email: String },
}

pub fn run(root: &Path, subcmd: TeamSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match subcmd {
        TeamSubcommand::List => {
            let members = store
                .list_team_members()
                .context("failed to load team roster")?;
            if json {
                let keyed: BTreeMap<&str, &TeamMember> =
                    members.iter().map(|m| (m.email.as_str(), m)).collect();
                return print_json(&keyed);
            }
            let rows = members
                .iter()
                .map(|m| {
                    vec![
                        m.email.clone(),
                        m.name.clone(),
                        m.role.clone(),
                        cell(m.department.as_deref()),
                        format!("{:.0}%", m.capacity * 100.0),
                    ]
                })
                .collect();
            print_table(&["EMAIL", "NAME", "ROLE", "DEPARTMENT", "CAPACITY"], rows);
        }
        TeamSubcommand::Show { email } => {
            let m = store.get_team_member(&email)?;
            if json {
                return print_json(&serde_json::json!({ "email": m.email, "member": m }));
            }
            println!("{} <{}>", m.name, m.email);
            println!("Role:       {}", m.role);
            println!("Department: {}", cell(m.department.as_deref()));
            println!("Manager:    {}", cell(m.manager.as_deref()));
            println!("Started:    {}", cell(m.start_date));
            println!("Capacity:   {:.0}%", m.capacity * 100.0);
            if !m.skills.is_empty() {
                println!("Skills:     {}", m.skills.join(", "));
            }
        }
    }
    Ok(())
}

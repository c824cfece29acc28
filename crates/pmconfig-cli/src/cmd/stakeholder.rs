use crate::cmd::open_store;
use crate::output::{cell, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use pmconfig_core::entities::StakeholderProfile;
use std::collections::BTreeMap;
use std::path::Path;

#[derive(Subcommand)]
pub enum StakeholderSubcommand {
    /// List stakeholder profiles
    List,
    /// Show one stakeholder
    Show { email: String },
}

pub fn run(root: &Path, subcmd: StakeholderSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match subcmd {
        StakeholderSubcommand::List => {
            let stakeholders = store
                .list_stakeholders()
                .context("failed to load stakeholders")?;
            if json {
                let keyed: BTreeMap<&str, &StakeholderProfile> =
                    stakeholders.iter().map(|s| (s.email.as_str(), s)).collect();
                return print_json(&keyed);
            }
            let rows = stakeholders
                .iter()
                .map(|s| {
                    vec![
                        s.email.clone(),
                        s.name.clone(),
                        s.role.clone(),
                        s.influence.level.to_string(),
                        s.preferences.channel.as_str().to_string(),
                    ]
                })
                .collect();
            print_table(&["EMAIL", "NAME", "ROLE", "INFLUENCE", "CHANNEL"], rows);
        }
        StakeholderSubcommand::Show { email } => {
            let s = store.get_stakeholder(&email)?;
            if json {
                return print_json(&serde_json::json!({ "email": s.email, "stakeholder": s }));
            }
            println!("{} <{}>", s.name, s.email);
            println!("Role:         {}", s.role);
            println!("Organization: {}", cell(s.organization.as_deref()));
            println!(
                "Influence:    {}{}",
                s.influence.level,
                if s.influence.decision_authority {
                    " (decision authority)"
                } else {
                    ""
                }
            );
            println!(
                "Contact:      {} / {} / {}",
                s.preferences.channel.as_str(),
                s.preferences.frequency.as_str(),
                s.preferences.detail_level.as_str()
            );
            println!("Last contact: {}", cell(s.last_contact));
            if !s.influence.interests.is_empty() {
                println!("Interests:    {}", s.influence.interests.join(", "));
            }
            if !s.concerns.is_empty() {
                println!("Concerns:     {}", s.concerns.join(", "));
            }
        }
    }
    Ok(())
}

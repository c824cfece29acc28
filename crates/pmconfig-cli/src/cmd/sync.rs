use crate::cmd::open_store;
use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use std::path::Path;

#[derive(Subcommand)]
pub enum SyncSubcommand {
    /// Copy names and roles from the team roster onto matching stakeholders
    Team,
    /// Write the notes file for a project
    Notes { id: String },
}

pub fn run(root: &Path, subcmd: SyncSubcommand, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    match subcmd {
        SyncSubcommand::Team => {
            let report = store
                .sync_team_to_stakeholders()
                .context("failed to sync team roster to stakeholders")?;
            if json {
                return print_json(&report);
            }
            for email in &report.updated {
                println!("  updated:   {email}");
            }
            for email in &report.skipped {
                println!("  skipped:   {email} (no stakeholder record)");
            }
            println!(
                "{} updated, {} unchanged, {} skipped",
                report.updated.len(),
                report.unchanged.len(),
                report.skipped.len()
            );
        }
        SyncSubcommand::Notes { id } => {
            let outcome = store
                .sync_project_to_notes(&id)
                .with_context(|| format!("failed to write notes for project '{id}'"))?;
            if json {
                return print_json(&outcome);
            }
            let verb = if outcome.written { "wrote" } else { "unchanged" };
            println!("{verb}: {}", outcome.path.display());
        }
    }
    Ok(())
}

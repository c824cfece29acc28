use anyhow::Context;
use pmconfig_core::{io, paths, settings::StoreSettings};
use std::path::Path;

/// Empty skeleton for each document `init` creates.
const DOCUMENTS: &[(&str, &str)] = &[
    (paths::PROJECTS_FILE, "projects: {}\n"),
    (paths::TEAM_ROSTER_FILE, "team_members: {}\n"),
    (paths::STAKEHOLDERS_FILE, "stakeholders: {}\n"),
    (paths::INTEGRATIONS_FILE, "integrations: {}\n"),
    (paths::DECISION_FRAMEWORKS_FILE, "{}\n"),
];

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing config store in: {}", root.display());

    io::ensure_dir(root).with_context(|| format!("failed to create {}", root.display()))?;

    let settings_path = paths::settings_path(root);
    if settings_path.exists() {
        println!("  exists:  {}", paths::SETTINGS_FILE);
    } else {
        StoreSettings::default()
            .save(root)
            .context("failed to write settings.yaml")?;
        println!("  created: {}", paths::SETTINGS_FILE);
    }

    for (name, skeleton) in DOCUMENTS {
        let created = io::write_if_missing(&root.join(name), skeleton.as_bytes())
            .with_context(|| format!("failed to write {name}"))?;
        if created {
            println!("  created: {name}");
        } else {
            println!("  exists:  {name}");
        }
    }

    let settings = StoreSettings::load(root).context("failed to load settings.yaml")?;
    let notes = root.join(&settings.notes_dir);
    io::ensure_dir(&notes).with_context(|| format!("failed to create {}", notes.display()))?;

    Ok(())
}

use crate::cmd::{open_store, parse_yaml};
use crate::output::{print_json, print_yaml};
use anyhow::Context;
use std::path::Path;

// ---------------------------------------------------------------------------
// get
// ---------------------------------------------------------------------------

pub fn get(root: &Path, name: &str, raw: bool, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let doc = if raw {
        store.load(name, None, true)
    } else {
        store.load_registered(name)
    }
    .with_context(|| format!("failed to load {name}"))?;

    if json {
        print_json(doc.as_ref())
    } else {
        print_yaml(doc.as_ref())
    }
}

// ---------------------------------------------------------------------------
// set
// ---------------------------------------------------------------------------

pub fn set(
    root: &Path,
    name: &str,
    updates: &str,
    replace: bool,
    backup: bool,
    json: bool,
) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let value = parse_yaml(updates)?;
    let outcome = if replace {
        store.write(name, &value, backup)
    } else {
        store.update(name, &value, backup)
    }
    .with_context(|| format!("failed to update {name}"))?;

    if json {
        print_json(&serde_json::json!({
            "path": outcome.path,
            "backup": outcome.backup,
        }))?;
    } else {
        println!("Updated {}", outcome.path.display());
        if let Some(b) = &outcome.backup {
            println!("  backup: {}", b.display());
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// restore
// ---------------------------------------------------------------------------

pub fn restore(root: &Path, name: &str, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let path = store
        .restore_backup(name)
        .with_context(|| format!("failed to restore {name}"))?;

    if json {
        print_json(&serde_json::json!({ "restored": path }))?;
    } else {
        println!("Restored {} from backup", path.display());
    }
    Ok(())
}

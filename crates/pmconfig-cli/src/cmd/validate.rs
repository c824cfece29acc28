use crate::cmd::open_store;
use crate::output::print_json;
use pmconfig_core::settings::WarnLevel;
use pmconfig_core::ConfigError;
use serde::Serialize;
use std::path::Path;

#[derive(Serialize)]
struct DocumentReport {
    name: String,
    status: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    problems: Vec<String>,
}

pub fn run(root: &Path, name: Option<&str>, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let warnings = store.settings().validate();

    let names: Vec<String> = match name {
        Some(n) => vec![n.to_string()],
        None => store
            .schemas()
            .file_names()
            .into_iter()
            .map(str::to_string)
            .collect(),
    };

    let mut reports = Vec::new();
    for name in names {
        let report = match store.load(&name, store.schemas().get(&name), false) {
            Ok(_) => DocumentReport {
                name,
                status: "ok",
                problems: Vec::new(),
            },
            Err(ConfigError::ConfigNotFound(_)) => DocumentReport {
                name,
                status: "missing",
                problems: Vec::new(),
            },
            Err(ConfigError::Validation { error, .. }) => DocumentReport {
                name,
                status: "invalid",
                problems: error.violations.iter().map(|v| v.to_string()).collect(),
            },
            Err(e) => DocumentReport {
                name,
                status: "invalid",
                problems: vec![e.to_string()],
            },
        };
        reports.push(report);
    }

    let invalid = reports.iter().filter(|r| r.status == "invalid").count();
    let settings_errors = warnings
        .iter()
        .filter(|w| w.level == WarnLevel::Error)
        .count();

    if json {
        print_json(&serde_json::json!({
            "settings": warnings,
            "documents": reports,
        }))?;
    } else {
        for w in &warnings {
            let label = match w.level {
                WarnLevel::Error => "ERROR",
                WarnLevel::Warning => "WARN ",
            };
            println!("[{label}] settings: {}", w.message);
        }
        for r in &reports {
            println!("{:<8} {}", r.status, r.name);
            for p in &r.problems {
                println!("  - {p}");
            }
        }
    }

    if invalid > 0 || settings_errors > 0 {
        anyhow::bail!(
            "{} document(s) invalid, {} settings error(s)",
            invalid,
            settings_errors
        );
    }
    Ok(())
}

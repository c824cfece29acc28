pub mod cache;
pub mod document;
pub mod init;
pub mod project;
pub mod stakeholder;
pub mod sync;
pub mod team;
pub mod validate;

use anyhow::Context;
use pmconfig_core::ConfigStore;
use std::path::Path;

pub fn open_store(root: &Path) -> anyhow::Result<ConfigStore> {
    ConfigStore::open(root)
        .with_context(|| format!("failed to open config store at {}", root.display()))
}

/// Parse a YAML value given on the command line.
pub fn parse_yaml(text: &str) -> anyhow::Result<serde_yaml::Value> {
    serde_yaml::from_str(text).with_context(|| format!("invalid YAML: {text}"))
}

use pmconfig_core::paths;
use std::path::{Path, PathBuf};

/// Resolve the config root directory.
///
/// Priority:
/// 1. `--root` flag / `PMCONFIG_ROOT` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for `.pmconfig/`
/// 3. Fall back to `<cwd>/.pmconfig`
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    find_config_dir(&cwd).unwrap_or_else(|| paths::config_dir(&cwd))
}

fn find_config_dir(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(paths::config_dir)
        .find(|candidate| candidate.is_dir())
}

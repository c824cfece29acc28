use crate::cmd::open_store;
use crate::output::print_json;
use clap::Subcommand;
use pmconfig_core::ConfigError;
use std::path::Path;

#[derive(Subcommand)]
pub enum CacheSubcommand {
    /// Load every registered document twice and report cache counters
    Stats,
}

pub fn run(root: &Path, subcmd: CacheSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        CacheSubcommand::Stats => stats(root, json),
    }
}

fn stats(root: &Path, json: bool) -> anyhow::Result<()> {
    let store = open_store(root)?;
    let names: Vec<String> = store
        .schemas()
        .file_names()
        .into_iter()
        .map(str::to_string)
        .collect();

    // The second pass shows which documents are served from memory.
    for _ in 0..2 {
        for name in &names {
            match store.load_registered(name) {
                Ok(_) | Err(ConfigError::ConfigNotFound(_)) => {}
                Err(e) => tracing::warn!(name = %name, error = %e, "document not cached"),
            }
        }
    }

    let stats = store.cache_stats();
    if json {
        return print_json(&stats);
    }

    println!("Cached documents: {}", stats.paths.len());
    for p in &stats.paths {
        println!("  {}", p.display());
    }
    println!("Approx. bytes:    {}", stats.approx_bytes);
    println!(
        "Hits: {} | Misses: {} | Disk reads: {}",
        stats.hits, stats.misses, stats.disk_reads
    );
    Ok(())
}

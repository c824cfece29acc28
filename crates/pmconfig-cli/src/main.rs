mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::{
    cache::CacheSubcommand, project::ProjectSubcommand, stakeholder::StakeholderSubcommand,
    sync::SyncSubcommand, team::TeamSubcommand,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "pmconfig",
    about = "Schema-validated YAML config store for projects, teams, and stakeholders",
    version,
    propagate_version = true
)]
struct Cli {
    /// Config root (default: nearest .pmconfig/ above the current directory)
    #[arg(long, global = true, env = "PMCONFIG_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    /// Log debug detail (cache hits, disk reads) to stderr
    #[arg(long, global = true, short = 'v')]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the config root with settings and empty documents
    Init,

    /// Print a document
    Get {
        /// Document name, e.g. projects.yaml
        name: String,
        /// Skip schema validation and print the file as parsed
        #[arg(long)]
        raw: bool,
    },

    /// Deep-merge YAML into a document
    Set {
        /// Document name, e.g. projects.yaml
        name: String,
        /// YAML mapping to merge; a null value deletes the key
        updates: String,
        /// Replace the document instead of merging
        #[arg(long)]
        replace: bool,
        /// Do not keep a .bak copy of the previous version
        #[arg(long)]
        no_backup: bool,
    },

    /// Validate settings and every registered document
    Validate {
        /// Validate only this document
        name: Option<String>,
    },

    /// Restore a document from its .bak copy
    Restore { name: String },

    /// Query and update projects
    Project {
        #[command(subcommand)]
        subcommand: ProjectSubcommand,
    },

    /// Query the team roster
    Team {
        #[command(subcommand)]
        subcommand: TeamSubcommand,
    },

    /// Query stakeholder profiles
    Stakeholder {
        #[command(subcommand)]
        subcommand: StakeholderSubcommand,
    },

    /// Propagate changes between documents
    Sync {
        #[command(subcommand)]
        subcommand: SyncSubcommand,
    },

    /// Inspect the document cache
    Cache {
        #[command(subcommand)]
        subcommand: CacheSubcommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Init => cmd::init::run(&root),
        Commands::Get { name, raw } => cmd::document::get(&root, &name, raw, cli.json),
        Commands::Set {
            name,
            updates,
            replace,
            no_backup,
        } => cmd::document::set(&root, &name, &updates, replace, !no_backup, cli.json),
        Commands::Validate { name } => cmd::validate::run(&root, name.as_deref(), cli.json),
        Commands::Restore { name } => cmd::document::restore(&root, &name, cli.json),
        Commands::Project { subcommand } => cmd::project::run(&root, subcommand, cli.json),
        Commands::Team { subcommand } => cmd::team::run(&root, subcommand, cli.json),
        Commands::Stakeholder { subcommand } => {
            cmd::stakeholder::run(&root, subcommand, cli.json)
        }
        Commands::Sync { subcommand } => cmd::sync::run(&root, subcommand, cli.json),
        Commands::Cache { subcommand } => cmd::cache::run(&root, subcommand, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

/// The Big IDEA:
/// Some files belong to me, not to the team repository: local configs,
/// secrets, scratch notes. I want git to track them privately without
/// them ever showing up in `git status` of the shared repository.
/// This tool keeps a managed section in `.git/info/exclude` for exactly
/// those paths, leaving everything else in that file untouched.
use anyhow::Result;
use clap::{Parser, Subcommand};
use pgit_exclude::builders::reporter::OutputFormat;
use pgit_exclude::utils;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "pgit-exclude")]
#[command(about = "Keep private files out of the main repository via .git/info/exclude")]
struct Cli {
    /// Show informational log messages
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default settings file for this repository
    Init,
    /// Add paths to the managed exclusions
    Add {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Remove paths from the managed exclusions
    Remove {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// List the managed exclusions
    List {
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
    /// Check whether a path is in the managed exclusions
    Check { path: String },
    /// Show the git state of a file
    Status {
        path: String,
        /// Only report the tracked and staged flags
        #[arg(long)]
        legacy: bool,
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "info" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Init => utils::initialize_repository(),
        Commands::Add { paths } => utils::add_paths(&paths),
        Commands::Remove { paths } => utils::remove_paths(&paths),
        Commands::List { format } => utils::list_managed(format),
        Commands::Check { path } => utils::check_path(&path),
        Commands::Status {
            path,
            legacy,
            format,
        } => utils::show_state(&path, legacy, format),
    }
}

//! editstore CLI
//!
//! Inspect and maintain the offline project database from the command line.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use editstore_core::LocalStore;

mod commands;
mod output;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "editstore")]
#[command(about = "Offline storage for editor projects, assets and scenes")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log storage activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use a specific config file
    #[arg(long = "config", global = true, value_name = "PATH")]
    config_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show database location, record counts and next ids
    Status,
    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },
    /// Inspect assets
    Asset {
        #[command(subcommand)]
        command: AssetCommands,
    },
    /// Inspect scenes
    Scene {
        #[command(subcommand)]
        command: SceneCommands,
    },
    /// Export one project as a JSON snapshot
    Export {
        /// Project ID
        id: i64,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import a project snapshot under fresh ids
    Import {
        /// Snapshot file
        file: PathBuf,
    },
    /// Write every project to a single backup file
    Backup {
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Import every project from a backup file
    Restore {
        /// Backup file
        file: PathBuf,
    },
    /// Delete all data and reset id counters
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum ProjectCommands {
    /// List all projects
    List,
    /// Create a new project
    Create {
        /// Project name
        name: String,
        /// Project description
        #[arg(short, long)]
        description: Option<String>,
    },
    /// Show a project with its branches
    Show {
        /// Project ID
        id: i64,
    },
    /// Rename a project
    Rename {
        /// Project ID
        id: i64,
        /// New name
        name: String,
    },
    /// Delete a project and everything in it
    Delete {
        /// Project ID
        id: i64,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AssetCommands {
    /// List assets of a project
    List {
        /// Project ID
        project: i64,
        /// Only assets on this branch
        #[arg(short, long)]
        branch: Option<String>,
    },
    /// Show one asset
    Show {
        /// Asset ID
        id: i64,
    },
}

#[derive(Subcommand)]
enum SceneCommands {
    /// List scenes of a project
    List {
        /// Project ID
        project: i64,
        /// Only scenes on this branch
        #[arg(short, long)]
        branch: Option<String>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, database_file, response_delay_ms)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    init_logging(cli.verbose);

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return handle_config_command(command.clone(), cli.config_file.as_ref(), &output);
    }

    let config = commands::config::load(cli.config_file.as_ref())?;
    let store = LocalStore::open(config)
        .await
        .context("Failed to open the offline database")?;
    debug!("Using database {:?}", store.path());

    match cli.command {
        Commands::Status => commands::status::show(&store, &output).await,
        Commands::Project { command } => handle_project_command(command, &store, &output).await,
        Commands::Asset { command } => match command {
            AssetCommands::List { project, branch } => {
                commands::asset::list(&store, project, branch, &output).await
            }
            AssetCommands::Show { id } => commands::asset::show(&store, id, &output).await,
        },
        Commands::Scene { command } => match command {
            SceneCommands::List { project, branch } => {
                commands::scene::list(&store, project, branch, &output).await
            }
        },
        Commands::Export { id, output: path } => {
            commands::transfer::export(&store, id, path, &output).await
        }
        Commands::Import { file } => commands::transfer::import(&store, file, &output).await,
        Commands::Backup { output: path } => commands::transfer::backup(&store, path, &output).await,
        Commands::Restore { file } => commands::transfer::restore(&store, file, &output).await,
        Commands::Clear { yes } => commands::clear::clear(&store, yes, &output).await,
        Commands::Config { .. } => unreachable!(), // Handled above
    }
}

async fn handle_project_command(
    command: ProjectCommands,
    store: &LocalStore,
    output: &Output,
) -> Result<()> {
    match command {
        ProjectCommands::List => commands::project::list(store, output).await,
        ProjectCommands::Create { name, description } => {
            commands::project::create(store, name, description, output).await
        }
        ProjectCommands::Show { id } => commands::project::show(store, id, output).await,
        ProjectCommands::Rename { id, name } => {
            commands::project::rename(store, id, name, output).await
        }
        ProjectCommands::Delete { id, yes } => {
            commands::project::delete(store, id, yes, output).await
        }
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Log to stderr so JSON and quiet output stay clean on stdout
///
/// `RUST_LOG` wins when set.
fn init_logging(verbose: bool) {
    let log_level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "editstore_core={},editstore_cli={}",
            log_level, log_level
        ))
    });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

//! tido CLI
//!
//! Command-line interface for tido - todo list management with optional
//! remote sync.

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};

use tido_core::{items_from_records, Auth, Config, TodoStore, WsCollection};

mod commands;
mod output;
mod tui;

use commands::Remote;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "tido")]
#[command(about = "tido - todo list management with optional remote sync")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI interface
    Tui,
    /// Add a todo item
    Add {
        /// Item text
        text: Vec<String>,
    },
    /// List all todo items
    #[command(alias = "ls")]
    List,
    /// Flip an item between done and pending
    #[command(alias = "done")]
    Toggle {
        /// Item ID (full or prefix)
        id: String,
    },
    /// Delete an item
    #[command(alias = "delete")]
    Rm {
        /// Item ID (full or prefix)
        id: String,
    },
    /// Show status (sync server, signed-in owner)
    Status,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Create a new owner identity on this device
    Signup,
    /// Sign in, adopting an existing owner identity if one is given
    Login {
        /// Owner key from another device (omit to validate stored credentials)
        owner: Option<String>,
    },
    /// Remove stored credentials
    Logout,
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, sync_url, sync_enabled)
        key: String,
        /// Configuration value
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // The TUI logs to a file instead; stderr would corrupt the screen
    let is_tui = matches!(&cli.command, Some(Commands::Tui) | None);
    if !is_tui {
        init_logging();
    }

    // Commands that don't need the store
    match &cli.command {
        Some(Commands::Config { command }) => {
            return handle_config_command(command.clone(), &output);
        }
        Some(Commands::Signup) => return commands::auth::signup(&output),
        Some(Commands::Login { owner }) => return commands::auth::login(owner.clone(), &output),
        Some(Commands::Logout) => return commands::auth::logout(&output),
        Some(Commands::Status) => {
            let config = Config::load()?;
            return commands::status::show(&config, &output);
        }
        _ => {}
    }

    // TUI is the default when no command is given
    if is_tui {
        return tui::run().await;
    }

    let config = Config::load()?;
    let mut store = TodoStore::new();

    // With sync enabled, the remote set is fetched up front so commands
    // operate on the latest data; without it the store starts empty.
    let remote = connect_remote(&config).await?;
    if let Some(remote) = &remote {
        let records = remote.collection.fetch(remote.session.owner()).await?;
        store.apply_remote(items_from_records(records));
    }

    match cli.command.unwrap() {
        Commands::Add { text } => {
            commands::todo::add(&mut store, remote.as_ref(), text.join(" "), &output).await
        }
        Commands::List => commands::todo::list(&store, &output),
        Commands::Toggle { id } => {
            commands::todo::toggle(&mut store, remote.as_ref(), &id, &output).await
        }
        Commands::Rm { id } => commands::todo::rm(&mut store, remote.as_ref(), &id, &output).await,
        // Handled above
        Commands::Tui
        | Commands::Status
        | Commands::Config { .. }
        | Commands::Signup
        | Commands::Login { .. }
        | Commands::Logout => unreachable!(),
    }
}

/// Connect to the sync server when sync is configured
///
/// Sign-in is the gate: with sync enabled, no remote work happens without
/// stored credentials, and a missing sign-in terminates the command.
async fn connect_remote(config: &Config) -> Result<Option<Remote>> {
    if !config.sync_enabled {
        return Ok(None);
    }
    let Some(url) = &config.sync_url else {
        return Ok(None);
    };

    let auth = Auth::with_config(config.clone());
    let session = auth.sign_in().map_err(|e| {
        anyhow!("{}. Run `tido signup` (first device) or `tido login <owner>` first.", e)
    })?;

    let collection = WsCollection::connect(url)
        .await
        .with_context(|| format!("Failed to connect to sync server {}", url))?;

    Ok(Some(Remote {
        collection: Arc::new(collection),
        session,
    }))
}

fn handle_config_command(command: Option<ConfigCommands>, output: &Output) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(output),
        Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, output),
    }
}

/// Log to stderr when TIDO_LOG is set, stay silent otherwise
fn init_logging() {
    if std::env::var("TIDO_LOG").is_ok() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_env("TIDO_LOG"))
            .with_writer(std::io::stderr)
            .init();
    }
}

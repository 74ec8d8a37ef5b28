//! # marknote CLI
//!
//! Command-line interface for publishing local markdown notes to the
//! remote note service.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "marknote")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Working directory used for workspace discovery
    #[arg(long, default_value = ".")]
    work_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new marknote workspace
    Init {
        /// Target directory (defaults to the current directory)
        destination: Option<PathBuf>,

        /// Developer token to write into the config (prompted if omitted)
        #[arg(long)]
        token: Option<String>,

        /// Service endpoint to write into the config (prompted if omitted)
        #[arg(long)]
        endpoint: Option<String>,
    },

    /// Get or set configuration values
    Config {
        /// Setting name; omit to show the whole configuration
        name: Option<String>,

        /// New value; omit to show the current value
        value: Option<String>,
    },

    /// Create a new local note
    New {
        /// Note title; wrap it in quotes to include spaces
        title: String,
    },

    /// Publish local note(s) to the remote service
    Publish {
        /// Note file path or directory of notes
        target: PathBuf,
    },

    /// Remove note(s) from the remote service
    Unpublish {
        /// Note file path or directory of notes
        target: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(if cli.verbose {
                tracing::Level::DEBUG.into()
            } else {
                tracing::Level::WARN.into()
            }),
        )
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Init {
            destination,
            token,
            endpoint,
        } => commands::init(destination.as_deref(), token, endpoint),
        Commands::Config { name, value } => {
            commands::config(&cli.work_dir, name.as_deref(), value.as_deref())
        }
        Commands::New { title } => commands::new_note(&cli.work_dir, &title).await,
        Commands::Publish { target } => commands::publish(&cli.work_dir, &target).await,
        Commands::Unpublish { target } => commands::unpublish(&cli.work_dir, &target).await,
    }
}

//! SceneSync CLI
//!
//! Command-line tools for inspecting and seeding SceneSync stores.
//!
//! # Commands
//!
//! - `load` - Decrypt and print a room's scene
//! - `save` - Save elements from a JSON file into a room
//! - `put-file` - Encrypt and upload an attachment
//! - `get-file` - Download and decrypt an attachment

mod commands;

use clap::{Parser, Subcommand};
use scenesync_storage::{BackendKind, StoreConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// SceneSync command-line store tools.
#[derive(Parser)]
#[command(name = "scenesync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the store directory (defaults to $SCENESYNC_STORE_DIR)
    #[arg(global = true, short, long)]
    store: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decrypt and print a room's scene
    Load {
        /// Room id
        #[arg(short, long)]
        room: String,

        /// Room key (base64url)
        #[arg(short, long)]
        key: String,
    },

    /// Save elements from a JSON file into a room
    Save {
        /// Room id
        #[arg(short, long)]
        room: String,

        /// Room key (base64url)
        #[arg(short, long)]
        key: String,

        /// JSON file holding an element array
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Encrypt and upload an attachment
    PutFile {
        /// Room key (base64url)
        #[arg(short, long)]
        key: String,

        /// File id
        #[arg(long)]
        id: String,

        /// File to upload
        #[arg(short, long)]
        input: PathBuf,

        /// MIME type
        #[arg(short, long, default_value = scenesync_codec::MIME_BINARY)]
        mime: String,
    },

    /// Download and decrypt an attachment
    GetFile {
        /// Room key (base64url)
        #[arg(short, long)]
        key: String,

        /// File id
        #[arg(long)]
        id: String,

        /// Write the decoded file here instead of printing its metadata
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Load { room, key } => {
            let config = store_config(cli.store)?;
            commands::scene::load(&config, &room, &key).await?;
        }
        Commands::Save { room, key, input } => {
            let config = store_config(cli.store)?;
            commands::scene::save(&config, &room, &key, &input).await?;
        }
        Commands::PutFile {
            key,
            id,
            input,
            mime,
        } => {
            let config = store_config(cli.store)?;
            commands::file::put(&config, &key, &id, &input, &mime).await?;
        }
        Commands::GetFile { key, id, output } => {
            let config = store_config(cli.store)?;
            commands::file::get(&config, &key, &id, output.as_deref()).await?;
        }
        Commands::Version => {
            println!("SceneSync CLI v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

/// Resolves the store directory from the flag or the environment.
fn store_config(flag: Option<PathBuf>) -> Result<StoreConfig, Box<dyn std::error::Error>> {
    let config = match flag {
        Some(root) => StoreConfig::directory(root),
        None => StoreConfig::from_env(),
    };
    if config.backend == BackendKind::Memory {
        return Err("Store directory required (--store or SCENESYNC_STORE_DIR)".into());
    }
    tracing::debug!(backend = ?config.backend, "store selected");
    Ok(config)
}

//! Stickercam CLI
//!
//! Live camera stickers, photos and clips from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Take a sepia photo with two stickers
//! stickercam snap --filter sepia --sticker cool@120,200 --sticker heart@300,90
//!
//! # Record five seconds of video
//! stickercam record --seconds 5 --sticker joy@40,80
//!
//! # Drive a session interactively
//! stickercam run
//! ```

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Stickercam - live camera compositing with stickers
#[derive(Parser)]
#[command(name = "stickercam")]
#[command(author = "GhostKellz")]
#[command(version)]
#[command(about = "Live camera stickers, photos and clips", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Configuration file (defaults to ~/.config/stickercam/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Take a photo
    Snap(commands::SnapArgs),

    /// Record a clip
    Record(commands::RecordArgs),

    /// Interactive session reading events from stdin
    Run(commands::RunArgs),

    /// List the sticker palette
    #[command(alias = "ls")]
    Stickers,

    /// Manage the configuration file
    Config(commands::ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(format!("stickercam={}", level).parse()?),
        )
        .with_target(false)
        .init();

    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Snap(args) => commands::snap(args, config_path).await?,
        Commands::Record(args) => commands::record(args, config_path).await?,
        Commands::Run(args) => commands::run(args, config_path).await?,
        Commands::Stickers => commands::stickers()?,
        Commands::Config(args) => commands::config(args, config_path)?,
    }

    Ok(())
}

//! Config command - manage configuration files

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::Path;
use stickercam_core::config::{sample_config, CaptureConfig, ConfigFile};

/// Arguments for the config command
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show the path to the config file
    Path,

    /// Show the effective configuration
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Generate a default config file
    Init {
        /// Force overwrite if file exists
        #[arg(short, long)]
        force: bool,
    },

    /// Print a sample configuration to stdout
    Sample,
}

/// Run config subcommand
pub fn config(args: ConfigArgs, config_path: Option<&Path>) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(ConfigFile::default_path);

    match args.command {
        ConfigCommand::Path => {
            println!("{}", path.display());
            if path.exists() {
                println!("(file exists)");
            } else {
                println!("(file does not exist)");
            }
        }
        ConfigCommand::Show { json } => show(&path, json)?,
        ConfigCommand::Init { force } => {
            if path.exists() && !force {
                println!("Configuration file already exists: {}", path.display());
                println!();
                println!("Use --force to overwrite, or edit the existing file.");
                return Ok(());
            }

            // Create parent directory if needed
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    std::fs::create_dir_all(parent).context("Failed to create config directory")?;
                }
            }

            std::fs::write(&path, sample_config()).context("Failed to write config file")?;

            println!("Created configuration file: {}", path.display());
            println!();
            println!("Edit this file to customize stickercam settings.");
        }
        ConfigCommand::Sample => {
            print!("{}", sample_config());
        }
    }

    Ok(())
}

fn show(path: &Path, json: bool) -> Result<()> {
    if !path.exists() {
        println!("No configuration file found at: {}", path.display());
        println!("Using default settings. Create a config file with:");
        println!("  stickercam config init");
        println!();
    }

    let file = ConfigFile::load_from(path.to_path_buf())?;
    let config = CaptureConfig::from_file(&file).context("Invalid configuration")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    println!("Configuration file: {}\n", path.display());
    println!("  Surface:     {}x{}", config.width, config.height);
    println!("  Framerate:   {} fps", config.fps);
    println!("  Glyph size:  {} px", config.glyph_size);
    println!("  Filter:      {}", config.filter);
    println!("  Mode:        {}", config.mode);
    println!("  Video:       {}", config.video_format);
    println!("  Queue:       {} frames", config.frame_queue);
    println!("  Source:      {}", config.source);
    println!("  Output dir:  {}", config.output_dir.display());

    for warning in config.validate() {
        println!("\nWarning: {}", warning);
    }

    println!("\nAs TOML:\n{}", toml::to_string_pretty(&file)?);
    Ok(())
}

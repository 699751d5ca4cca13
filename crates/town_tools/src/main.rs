//! Townplan - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use town_core::town::{build_town, TownLayout};
use town_tools::report::{render_audit, render_json, render_text};
use town_tools::validate::{resolve_config, validate_config_file, ToolError};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "town-tools")]
#[command(about = "Development tools for procedural town layouts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a town and print its reports
    Generate {
        /// Layout config (RON); the built-in town when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the config seed
        #[arg(long)]
        seed: Option<u64>,
        /// Dump the full layout as JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Validate a layout config file
    Validate {
        /// Path to the RON config
        path: PathBuf,
    },
    /// Build a town and print only the collision audit
    Audit {
        /// Layout config (RON); the built-in town when omitted
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the config seed
        #[arg(long)]
        seed: Option<u64>,
    },
}

fn build(config: Option<&PathBuf>, seed: Option<u64>) -> Result<TownLayout, ToolError> {
    let config = resolve_config(config.map(PathBuf::as_path), seed)?;
    Ok(build_town(&config)?)
}

fn run(command: Commands) -> Result<(), ToolError> {
    match command {
        Commands::Generate { config, seed, json } => {
            let town = build(config.as_ref(), seed)?;
            if json {
                println!("{}", render_json(&town)?);
            } else {
                print!("{}", render_text(&town));
            }
        }
        Commands::Validate { path } => {
            tracing::info!("Validating layout config: {}", path.display());
            let rules = validate_config_file(&path)?;
            tracing::info!(
                seed = rules.seed,
                roads = rules.grid.roads.len(),
                "Validation passed"
            );
        }
        Commands::Audit { config, seed } => {
            let town = build(config.as_ref(), seed)?;
            print!("{}", render_audit(&town));
        }
    }
    Ok(())
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.command) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

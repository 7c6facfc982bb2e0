//! manifest-css command-line entry point.

use anyhow::Result;
use clap::{ColorChoice, Parser};
use manifest_css::cli::{self, Cli, Commands};
use manifest_css::config::ProjectConfig;

fn main() -> Result<()> {
    // Setup global Ctrl+C handler (before any blocking operations)
    manifest_css::core::setup_shutdown_handler()?;

    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }

    let config = ProjectConfig::load(&cli)?;

    match &cli.command {
        Commands::Init { name, dry } => cli::init::new_project(&config, name.is_some(), *dry),
        Commands::Build { .. } => cli::build::build_project(&config),
        Commands::Watch { events, .. } => cli::watch::watch_project(&config, *events),
        Commands::Cache { action } => cli::cache::run_cache(&config, *action),
    }
}

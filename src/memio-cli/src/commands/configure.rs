//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting up memio CLI defaults.

use crate::config::Config;
use anyhow::Result;

/// Handle the configure command
pub fn handle(process: Option<String>, log_level: Option<String>, show: bool) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if process.is_none() && log_level.is_none() {
        show_usage();
        return Ok(());
    }

    apply(&mut config, process, log_level);
    config.save()?;

    show_config(&config);
    if let Ok(path) = Config::config_path() {
        println!("Config saved to: {}", path.display());
    }

    Ok(())
}

fn apply(config: &mut Config, process: Option<String>, log_level: Option<String>) {
    if let Some(process) = process {
        config.process = Some(process);
    }
    if let Some(level) = log_level {
        config.log_level = Some(level);
    }
}

/// Display current configuration
fn show_config(config: &Config) {
    match &config.process {
        Some(name) => println!("Process: {}", name),
        None => println!("No default process configured"),
    }
    match &config.log_level {
        Some(level) => println!("Log level: {}", level),
        None => println!("Log level: default"),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: memio configure --process NAME");
    println!("   or: memio configure --log-level memio=debug");
    println!("   or: memio configure --show");
}

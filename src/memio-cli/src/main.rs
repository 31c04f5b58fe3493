mod cli;
mod commands;
mod config;
mod target;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::*;
use commands::memory::Output;

const DEFAULT_FILTER: &str = "memio=warn";

/// RUST_LOG wins, then the configured level, then [`DEFAULT_FILTER`]
fn init_tracing(config: &Config) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.as_deref().unwrap_or(DEFAULT_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load()?;
    init_tracing(&config);

    match cli.command {
        Commands::Configure {
            process,
            log_level,
            show,
        } => {
            commands::configure::handle(process, log_level, show)?;
        }

        Commands::Types { verbose } => {
            commands::types::handle(verbose)?;
        }

        Commands::Read {
            address,
            count,
            type_name,
            array,
            hex,
            json,
        } => {
            let process = target::attach(&cli.target, &config)?;
            let output = if json {
                Output::Json
            } else if hex {
                Output::Hex
            } else {
                Output::Plain
            };
            commands::memory::handle_read(
                &process,
                &address,
                count,
                type_name.as_deref(),
                array,
                output,
            )?;
        }

        Commands::Write {
            address,
            type_name,
            values,
        } => {
            let process = target::attach(&cli.target, &config)?;
            commands::memory::handle_write(&process, &address, type_name.as_deref(), &values)?;
        }

        Commands::SetString { address, text } => {
            let process = target::attach(&cli.target, &config)?;
            commands::memory::handle_set_string(&process, &address, &text)?;
        }

        Commands::Regions { maps } => {
            let process = target::attach(&cli.target, &config)?;
            commands::memory::handle_regions(&process, maps)?;
        }

        Commands::Eval { expression } => {
            let process = target::attach(&cli.target, &config)?;
            commands::memory::handle_eval(&process, &expression)?;
        }
    }

    Ok(())
}

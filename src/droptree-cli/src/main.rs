mod cli;
mod commands;
mod config;
mod file_utils;

use anyhow::Result;
use clap::Parser;
use config::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "droptree=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load()?;

    match cli.command {
        Commands::Inject {
            batch,
            items,
            skip_prefix,
            quality,
        } => {
            commands::inject::handle(&batch, items.as_deref(), &skip_prefix, &quality, &config)?;
        }

        Commands::Rebalance { batch, filter } => {
            commands::rebalance::handle(&batch, filter.as_deref(), &config)?;
        }

        Commands::Inspect { file } => {
            commands::inspect::inspect(&file)?;
        }

        Commands::Roll { file, count, seed } => {
            commands::inspect::roll(&file, count, seed)?;
        }

        Commands::Tables { check } => {
            commands::tables::handle(check, &config)?;
        }

        Commands::Configure { items_dir, show } => {
            commands::configure::handle(items_dir, show, &config)?;
        }
    }

    Ok(())
}

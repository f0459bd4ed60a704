mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use plgrab::config::Config;
use plgrab::observability;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    observability::init_tracing();

    let cli = Cli::parse();

    let config = match cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Extract(args) => commands::extract(&config, args).await?,
        Commands::Download(args) => commands::download(&config, args).await?,
    }

    Ok(())
}

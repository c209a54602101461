//! pdfchat CLI entry point.

use anyhow::Result;
use clap::Parser;

use pdfchat::cli::{commands, handle_error, Cli, Commands};
use pdfchat::infrastructure::config::ConfigLoader;
use pdfchat::infrastructure::logging::{LogConfig, LoggerImpl};
use pdfchat::infrastructure::AppContext;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    if let Err(err) = run(cli).await {
        handle_error(err, json);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load_from_file(path)?,
        None => ConfigLoader::load()?,
    };

    let log_config = LogConfig::try_from(&config.logging).map_err(anyhow::Error::msg)?;
    let _logger = LoggerImpl::init(&log_config)?;

    if matches!(cli.command, Commands::Config) {
        return commands::config::execute(&config, cli.json);
    }

    let app = AppContext::build(config).await?;
    match cli.command {
        Commands::Ingest(args) => commands::ingest::execute(&app, args, cli.json).await,
        Commands::Context(args) => commands::context::execute(&app, args, cli.json).await,
        Commands::Ask(args) => commands::ask::execute(&app, args, cli.json).await,
        Commands::Serve(args) => commands::serve::execute(app, args).await,
        Commands::Config => Ok(()),
    }
}

use anyhow::Result;
use clap::Parser;
use qbt_client::cli::{self, Cli};
use qbt_client::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load_with_cli(&cli.overrides())?;
    config.validate()?;

    cli::setup_logging(&config.logging.level, cli.verbose, cli.quiet)?;
    tracing::debug!(url = %config.api.url, "Configuration loaded");

    if let Err(e) = cli::run(cli, config).await {
        tracing::error!("Error: {:#}", e);
        if let Some(hint) = cli::error_hint(&e) {
            eprintln!("Hint: {}", hint);
        }
        std::process::exit(1);
    }

    Ok(())
}

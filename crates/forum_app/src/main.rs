mod cli;
mod commands;
mod config;

use clap::Parser;
use forum_logging::{forum_error, forum_info};

use crate::cli::Cli;
use crate::config::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    cli.apply_overrides(&mut config);
    forum_logging::initialize(&config.log_destination(), config.log_level());
    forum_info!("Harvesting from {}", config.site_url);

    let result = commands::run(cli.command, &config).await;
    if let Err(err) = &result {
        forum_error!("forum_harvest failed: {:#}", err);
    }
    result
}

pub mod cli;
pub mod core;
pub mod providers;
pub mod server;
pub mod store;

use crate::core::config::AppConfig;
use anyhow::Result;
use std::net::SocketAddr;
use tracing::{debug, info};

pub enum AppCommand {
    Serve {
        listen: Option<SocketAddr>,
    },
    Funds {
        provider: String,
    },
    Quotes {
        provider: String,
        fund: String,
        page: Option<i64>,
    },
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    // Caches live as long as the providers built here
    let providers = providers::build_providers(&config)?;

    match command {
        AppCommand::Serve { listen } => {
            info!("Quotes server starting...");
            server::serve(listen.unwrap_or(config.server.listen), providers).await
        }
        AppCommand::Funds { provider } => {
            println!("{}", cli::lookup::funds_json(&providers, &provider).await?);
            Ok(())
        }
        AppCommand::Quotes {
            provider,
            fund,
            page,
        } => {
            println!(
                "{}",
                cli::lookup::quotes_json(&providers, &provider, &fund, page).await?
            );
            Ok(())
        }
    }
}

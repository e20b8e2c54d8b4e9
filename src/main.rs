use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use quotes::core::log::init_logging;
use std::net::SocketAddr;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Serve fund quotes over HTTP
    Serve {
        /// Address to listen on, overrides the configured one
        #[arg(short, long)]
        listen: Option<SocketAddr>,
    },
    /// Print the funds of a provider
    Funds {
        /// Provider name, e.g. meesman
        provider: String,
    },
    /// Print the quotes of a fund
    Quotes {
        /// Provider name, e.g. brandnewday
        provider: String,
        /// Fund slug as printed by `funds`
        fund: String,
        /// Result page, for paginated providers
        #[arg(short, long)]
        page: Option<i64>,
    },
}

impl From<Commands> for quotes::AppCommand {
    fn from(cmd: Commands) -> quotes::AppCommand {
        match cmd {
            Commands::Serve { listen } => quotes::AppCommand::Serve { listen },
            Commands::Funds { provider } => quotes::AppCommand::Funds { provider },
            Commands::Quotes {
                provider,
                fund,
                page,
            } => quotes::AppCommand::Quotes {
                provider,
                fund,
                page,
            },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => quotes::cli::setup::setup_at_path(path),
            None => quotes::cli::setup::setup(),
        },
        Some(cmd) => quotes::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}

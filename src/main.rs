mod cli;
mod server;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use lesion::config::LesionConfig;

#[derive(Parser)]
#[command(name = "lesion", version, about = "Dissociation query engine for annotated study corpora")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Start the HTTP server
    Serve,
    /// Run a one-off dissociation query from the terminal
    Dissociate(cli::dissociate::DissociateArgs),
    /// Print corpus statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = LesionConfig::load()?;

    // Initialize tracing with the configured log level.
    // Log to stderr so stdout stays clean for piped query output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Serve => {
            server::serve(config).await?;
        }
        Command::Dissociate(args) => {
            cli::dissociate::run(&config, args)?;
        }
        Command::Stats => {
            cli::stats::run(&config)?;
        }
    }

    Ok(())
}

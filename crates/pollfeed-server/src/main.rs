//! pollfeed-server - shared append-only feed over HTTP.

use anyhow::Result;
use clap::{Parser, Subcommand};

use pollfeed_server::api::server;
use pollfeed_server::config::{resolve_db_path, ServerConfig};
use pollfeed_server::db::MessageLog;

#[derive(Parser)]
#[command(name = "pollfeed-server")]
#[command(version, about = "Append-only shared text feed served over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the feed
    Serve {
        /// Listen address (default: $POLLFEED_BIND or 127.0.0.1:8080)
        #[arg(long)]
        bind: Option<String>,

        /// Database path (default: $POLLFEED_DB or ~/.pollfeed/feed.db)
        #[arg(long)]
        db: Option<String>,
    },

    /// Print message count and highest id straight from the database
    Stats {
        /// Database path
        #[arg(long)]
        db: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, db } => {
            let config = ServerConfig::resolve(bind, db)?;
            server::serve(&config).await
        }
        Commands::Stats { db } => cmd_stats(db),
    }
}

fn cmd_stats(db: Option<String>) -> Result<()> {
    let log = MessageLog::open(&resolve_db_path(db))?;
    let stats = log.stats()?;
    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}

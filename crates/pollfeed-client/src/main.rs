//! pollfeed - command-line participant for a pollfeed server.
//!
//! One-shot commands map to a single query; `watch` runs a full sync
//! session that reads lines from stdin and sends them.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::process::ExitCode;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use pollfeed_client::config::resolve_base_url;
use pollfeed_client::output::{format_error, take_unprinted, OutputControls};
use pollfeed_client::sync::{PollReport, SharedSession};
use pollfeed_client::{FeedApi, FocusState, HttpFeedClient, PollScheduler, SyncConfig, SyncSession};
use pollfeed_core::policy::{DEFAULT_AUTHOR, DEFAULT_RECENT_COUNT, HARD_CAP};

#[derive(Parser, Debug)]
#[command(name = "pollfeed")]
#[command(version, about = "Read and post to a shared pollfeed log", long_about = None)]
struct Cli {
    /// Server base URL (default: $POLLFEED_URL or http://127.0.0.1:8080)
    #[arg(long, global = true)]
    url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout: u64,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Compact JSON output (no whitespace)
    #[arg(long, global = true)]
    compact: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Append a message to the log
    Send {
        /// Display name
        #[arg(short, long)]
        author: Option<String>,

        /// Message text (words are joined with spaces)
        #[arg(required = true)]
        message: Vec<String>,
    },

    /// Show the newest messages
    Recent {
        /// Number of messages (1-200)
        #[arg(short, long, default_value_t = DEFAULT_RECENT_COUNT)]
        count: u32,
    },

    /// Show messages after a cursor id
    Since {
        cursor: u64,

        /// Max messages (capped at 200)
        #[arg(short, long, default_value_t = HARD_CAP)]
        limit: u32,
    },

    /// Show message count and highest id
    Stats,

    /// Follow the feed live; lines on stdin are sent as messages
    Watch {
        /// Display name used for sent lines
        #[arg(short, long, default_value = DEFAULT_AUTHOR)]
        author: String,

        /// Local view capacity
        #[arg(long, default_value_t = 1200)]
        capacity: usize,

        /// Foreground poll period in milliseconds
        #[arg(long, default_value_t = 1500)]
        active_ms: u64,

        /// Background poll period in milliseconds
        #[arg(long, default_value_t = 5000)]
        background_ms: u64,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let controls = OutputControls {
        json: cli.json,
        compact: cli.compact,
    };

    match run(cli, controls).await {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            if controls.json {
                println!("{}", format_error(&format!("{:#}", e)));
            } else {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli, controls: OutputControls) -> Result<()> {
    let base_url = resolve_base_url(cli.url);
    let client = HttpFeedClient::new(&base_url, Duration::from_secs(cli.timeout))?;

    match cli.command {
        Command::Send { author, message } => {
            let body = message.join(" ");
            let id = client.send(author.as_deref(), &body).await?;
            if controls.json {
                controls.print(&serde_json::json!({ "ok": true, "id": id }));
            } else {
                println!("Sent message #{}", id);
            }
        }
        Command::Recent { count } => {
            let messages = client.fetch_recent(count).await?;
            controls.print_messages(&messages);
        }
        Command::Since { cursor, limit } => {
            let messages = client.fetch_since(cursor, limit).await?;
            controls.print_messages(&messages);
        }
        Command::Stats => {
            let stats = client.stats().await?;
            if controls.json {
                controls.print(&stats);
            } else {
                println!("{} messages, max id {}", stats.total, stats.max_id);
            }
        }
        Command::Watch {
            author,
            capacity,
            active_ms,
            background_ms,
        } => {
            let config = SyncConfig {
                active_interval: Duration::from_millis(active_ms),
                background_interval: Duration::from_millis(background_ms),
                capacity,
                ..SyncConfig::default()
            };
            watch(client, config, &author, controls).await?;
        }
    }
    Ok(())
}

async fn watch(
    client: HttpFeedClient,
    config: SyncConfig,
    author: &str,
    controls: OutputControls,
) -> Result<()> {
    let session = SyncSession::new(client, config.clone()).into_shared();
    let (tx, mut reports) = mpsc::unbounded_channel();
    let mut scheduler = PollScheduler::new(session.clone(), &config).with_reports(tx);
    let mut last_printed = 0u64;

    // The initial report also arrives through the channel.
    if let Err(e) = scheduler.start().await {
        eprintln!("Initial load failed ({}); will keep retrying.", e);
    }
    eprintln!("Commands: /away /back /resync /retry /status /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(report) = reports.recv() => {
                print_new(&controls, &mut last_printed, &report);
            }
            line = lines.next_line() => {
                let Some(line) = line.context("reading stdin")? else {
                    break;
                };
                let line = line.trim();
                match line {
                    "" => {}
                    "/quit" => break,
                    "/away" => scheduler.set_focus(FocusState::Background),
                    "/back" => scheduler.set_focus(FocusState::Foreground),
                    "/status" => print_status(&session).await,
                    "/resync" => {
                        let result = session.lock().await.poll(true).await;
                        match result {
                            Ok(report) => print_new(&controls, &mut last_printed, &report),
                            Err(e) => eprintln!("Resync failed: {}", e),
                        }
                    }
                    "/retry" => {
                        let result = session.lock().await.retry_send().await;
                        match result {
                            Ok(Some(sent)) => {
                                if let Ok(report) = &sent.resync {
                                    print_new(&controls, &mut last_printed, report);
                                }
                            }
                            Ok(None) => eprintln!("Nothing to retry."),
                            Err(e) => eprintln!("Send failed again: {} (/retry to resend)", e),
                        }
                    }
                    body => {
                        let result = session.lock().await.send(author, body).await;
                        match result {
                            Ok(sent) => match &sent.resync {
                                Ok(report) => print_new(&controls, &mut last_printed, report),
                                Err(e) => eprintln!("Sent #{} but resync failed: {}", sent.id, e),
                            },
                            Err(e) => eprintln!("Send failed: {} (/retry to resend)", e),
                        }
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    scheduler.stop();
    Ok(())
}

fn print_new(controls: &OutputControls, last_printed: &mut u64, report: &PollReport) {
    for msg in take_unprinted(&report.added, last_printed) {
        controls.print_live(msg);
    }
}

async fn print_status<A: FeedApi>(session: &SharedSession<A>) {
    let session = session.lock().await;
    let stats = session
        .last_stats()
        .map(|s| format!("{} messages, max id {}", s.total, s.max_id))
        .unwrap_or_else(|| "no stats yet".to_string());
    let synced = session
        .last_sync()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| "never".to_string());
    eprintln!(
        "status: {} | cursor {} | {} in view | {} | last sync {}{}",
        session.status(),
        session.cursor(),
        session.view().len(),
        stats,
        synced,
        if session.draft().is_some() { " | unsent draft" } else { "" }
    );
}

//! rtorrent-cli - Command-line interface for the rTorrent control socket
//!
//! Provides subcommands for raw calls, torrent and tracker listings, and
//! the actions of the torrent detail view (scrape, tags, comment).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rtorrent_rpc::panel;
use rtorrent_rpc::rpc::config::{self, ClientConfig, Endpoint};
use rtorrent_rpc::rpc::{Caller, ScgiTransport, Value};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rtorrent-cli")]
#[command(about = "Query and control an rTorrent daemon over XML-RPC", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Control socket (host:port, tcp://host:port, unix:///path)
    #[arg(short, long)]
    endpoint: Option<Endpoint>,

    /// Timeout for one exchange in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke a single method
    Call {
        /// Method name, e.g. system.client_version
        method: String,

        /// Parameters; integers are sent as <int>, everything else as <string>
        params: Vec<String>,
    },

    /// List every torrent of the default view
    Torrents,

    /// List the trackers of a torrent
    Trackers {
        /// Info-hash
        hash: String,
    },

    /// Show the general details of a torrent
    Details {
        /// Info-hash
        hash: String,
    },

    /// Trigger a tracker scrape
    Scrape {
        /// Info-hash
        hash: String,
    },

    /// Replace the tags of a torrent
    Tag {
        /// Info-hash
        hash: String,

        /// Space-separated tags
        tags: String,
    },

    /// Replace the comment of a torrent
    Comment {
        /// Info-hash
        hash: String,

        /// Comment text, stored percent-encoded
        text: String,
    },

    /// Write a configuration file with the effective settings
    InitConfig {
        /// Destination path
        path: PathBuf,
    },
}

fn resolve_config(cli: &Cli) -> Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(endpoint) = &cli.endpoint {
        config.endpoint = endpoint.clone();
    }
    if let Some(timeout_ms) = cli.timeout_ms {
        config.timeout_ms = timeout_ms;
    }
    Ok(config)
}

fn parse_param(raw: &str) -> Value {
    match raw.parse::<i64>() {
        Ok(num) => Value::Integer(num),
        Err(_) => Value::from(raw),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!(
        "{}",
        serde_json::to_string_pretty(value).context("Failed to render output")?
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    // The transport connects lazily, once per call.
    let caller = Caller::new(ScgiTransport::from_config(&config));

    match cli.command {
        Commands::Call { method, params } => {
            let params: Vec<Value> = params.iter().map(|raw| parse_param(raw)).collect();
            let value = caller.call(&method, &params).await?;
            print_json(&value.to_json())?;
        }

        Commands::Torrents => {
            let torrents = panel::list_torrents(&caller).await?;
            if torrents.is_empty() {
                eprintln!("No torrents added yet.");
            }
            print_json(&torrents)?;
        }

        Commands::Trackers { hash } => {
            let trackers = panel::torrent_trackers(&caller, &hash, chrono::Utc::now()).await?;
            print_json(&trackers)?;
        }

        Commands::Details { hash } => {
            let details = panel::torrent_details(&caller, &hash).await?;
            let rendered: Vec<_> = details.iter().map(|record| record.to_json()).collect();
            print_json(&rendered)?;
        }

        Commands::Scrape { hash } => {
            panel::scrape_trackers(&caller, &hash).await?;
            println!("Scrape requested for {}", hash);
        }

        Commands::Tag { hash, tags } => {
            panel::set_tags(&caller, &hash, &tags).await?;
            println!("Tags of {} set to '{}'", hash, tags);
        }

        Commands::Comment { hash, text } => {
            panel::set_comment(&caller, &hash, &text).await?;
            println!("Comment of {} updated", hash);
        }

        Commands::InitConfig { path } => {
            config::write_config(&path, &config)?;
            println!("Wrote configuration to {:?}", path);
        }
    }

    Ok(())
}

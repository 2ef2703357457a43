//! globecache - drive the offline worker from the command line.
//!
//! Each subcommand delivers one lifecycle event to the worker, backed by the
//! real network and the on-disk cache partitions, and waits for all work the
//! event started before exiting.

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use globecache_core::{
    CacheStorage, DiskStorage, EventOutcome, FetchOutcome, HttpFetcher, MessageOutcome, Method,
    OfflineCacheManager, Request, SyncOutcome, WaitUntil, WorkerConfig, WorkerEvent,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Maximum number of body bytes echoed by `fetch`
const MAX_BODY_PREVIEW: usize = 300;

#[derive(Parser)]
#[command(name = "globecache", version, about = "Stale-while-revalidate offline cache")]
struct Cli {
    /// Config file (defaults to ~/.config/globecache/config.json)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory holding the cache partitions
    #[arg(long, global = true, env = "GLOBECACHE_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Pre-cache the static asset list
    Install,
    /// Delete partitions from previous versions
    Activate,
    /// Request a URL through the worker
    Fetch {
        url: String,
        /// Accept header to send
        #[arg(long, default_value = "*/*")]
        accept: String,
        #[arg(long, default_value = "GET")]
        method: String,
    },
    /// Eagerly cache URLs into the runtime partition
    Warm {
        #[arg(required = true)]
        urls: Vec<String>,
    },
    /// Post a raw JSON control message
    Message { json: String },
    /// Trigger a background sync
    Sync { tag: Option<String> },
    /// List cache partitions and their entries
    Status,
    /// Print the effective configuration
    Config,
}

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<WorkerConfig> {
    let mut config = match path {
        Some(path) => WorkerConfig::load_from(path),
        None => WorkerConfig::load(),
    }
    .context("Failed to load configuration")?;

    if let Ok(scope) = std::env::var("GLOBECACHE_SCOPE") {
        config.scope = scope;
    }
    if let Ok(version) = std::env::var("GLOBECACHE_VERSION") {
        config.version = version;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    init_tracing();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_ref())?;

    let cache_dir = match cli.cache_dir {
        Some(dir) => dir,
        None => config.cache_dir()?,
    };
    let storage = Arc::new(
        DiskStorage::new(cache_dir.clone())
            .with_context(|| format!("Failed to open cache directory {}", cache_dir.display()))?,
    );
    let fetcher = Arc::new(HttpFetcher::new()?);
    let manager = OfflineCacheManager::new(config, storage.clone(), fetcher);

    let event = match cli.command {
        Command::Install => WorkerEvent::Install,
        Command::Activate => WorkerEvent::Activate,
        Command::Fetch {
            url,
            accept,
            method,
        } => {
            let url = manager.config().resolve(&url)?;
            let method = Method::from_bytes(method.to_uppercase().as_bytes())
                .with_context(|| format!("Invalid method: {}", method))?;
            WorkerEvent::Fetch(Request::new(method, url).with_header("Accept", &accept))
        }
        Command::Warm { urls } => WorkerEvent::Message(serde_json::json!({
            "type": "CACHE_URLS",
            "urls": urls,
        })),
        Command::Message { json } => {
            WorkerEvent::Message(serde_json::from_str(&json).context("Message is not valid JSON")?)
        }
        Command::Sync { tag } => {
            WorkerEvent::Sync(tag.unwrap_or_else(|| manager.config().sync_tag.clone()))
        }
        Command::Status => return print_status(storage.as_ref(), manager.config()).await,
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(manager.config())?);
            return Ok(());
        }
    };

    let mut wait_until = WaitUntil::new();
    let outcome = manager.dispatch(event, &mut wait_until).await;
    let settled = wait_until.settle().await;
    info!(settled, "Event settled");

    report(outcome?);
    Ok(())
}

fn report(outcome: EventOutcome) {
    match outcome {
        EventOutcome::Installed => println!("Installed; static assets cached"),
        EventOutcome::Activated { deleted } => {
            if deleted.is_empty() {
                println!("Activated; no old caches");
            } else {
                println!("Activated; deleted {}", deleted.join(", "));
            }
        }
        EventOutcome::Fetch(FetchOutcome::PassThrough) => {
            println!("Not intercepted (only GET over http/https is cached)")
        }
        EventOutcome::Fetch(outcome) => {
            let source = match &outcome {
                FetchOutcome::Cached(_) => "cache",
                FetchOutcome::Offline(_) => "offline page",
                _ => "network",
            };
            if let Some(response) = outcome.response() {
                let text = response.text();
                let preview: String = text.chars().take(MAX_BODY_PREVIEW).collect();
                println!("{} ({}, {} bytes)", response.status, source, response.body.len());
                println!("{}", preview);
            }
        }
        EventOutcome::Message(MessageOutcome::SkipWaiting) => println!("Skip waiting requested"),
        EventOutcome::Message(MessageOutcome::Warmed(report)) => {
            println!("Cached {} URL(s)", report.cached.len());
            for (url, reason) in report.failed {
                println!("  failed {}: {}", url, reason);
            }
        }
        EventOutcome::Message(MessageOutcome::Ignored) => println!("Message ignored"),
        EventOutcome::Sync(SyncOutcome::Completed { records }) => {
            println!("Sync completed ({} records)", records)
        }
        EventOutcome::Sync(SyncOutcome::Failed(reason)) => println!("Sync failed: {}", reason),
        EventOutcome::Sync(SyncOutcome::Ignored) => println!("Unknown sync tag"),
    }
}

async fn print_status(storage: &dyn CacheStorage, config: &WorkerConfig) -> Result<()> {
    let names = storage.keys().await?;
    if names.is_empty() {
        println!("No cache partitions");
        return Ok(());
    }

    for name in names {
        let marker = if config.is_current_partition(&name) {
            ""
        } else {
            " (old)"
        };
        let entries = storage.entries(&name).await?;
        println!("{}{} - {} entries", name, marker, entries.len());
        for (key, entry) in entries {
            println!(
                "  {} {} [{}]",
                entry.response.status,
                key.url,
                entry.age_display()
            );
        }
    }
    Ok(())
}

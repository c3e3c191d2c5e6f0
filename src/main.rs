//! tripcache - Offline cache and sync layer for TripMate
//!
//! A command-line companion to the TripMate travel planner that precaches the
//! app shell and data, answers GET requests from versioned caches when the
//! network is down, and replays queued itinerary writes once connectivity
//! returns.

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tripcache::cli::{self, Cli, Command};
use tripcache::config::OfflineConfig;
use tripcache::layer::{OfflineLayer, SaveOutcome};
use tripcache::router::Request;
use tripcache::store::CacheStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("tripcache=info".parse()?))
        .init();

    let args = Cli::parse();

    // Load configuration
    let config = OfflineConfig::load(args.config.as_deref())?;
    let mut layer = OfflineLayer::open(config)?.with_offline(args.offline);

    match args.command {
        Command::Status => {
            println!("Phase:   {}", layer.phase().as_str());
            let online = layer.is_online().await;
            println!("Network: {}", if online { "online" } else { "offline" });
            let report = layer.store().size_report()?;
            if report.namespaces.is_empty() {
                println!("Caches:  (empty)");
            } else {
                println!("Caches:");
                for namespace in &report.namespaces {
                    println!(
                        "  {:<14} {:>5} entries {:>10} bytes",
                        namespace.namespace, namespace.entries, namespace.bytes
                    );
                }
                println!(
                    "  {:<14} {:>5} entries {:>10} bytes",
                    "total",
                    report.total_entries(),
                    report.total_bytes()
                );
            }
            println!("Queued writes: {}", layer.queue().len()?);
        }
        Command::Warm => {
            let install = layer.install().await;
            println!(
                "Precached {}/{} manifest entries",
                install.cached, install.requested
            );
            for url in &install.failed {
                println!("  failed: {url}");
            }
            let activate = layer.activate()?;
            if activate.removed.is_empty() {
                println!("No stale cache versions to remove");
            } else {
                println!("Removed stale cache versions: {}", activate.removed.join(", "));
            }
        }
        Command::Fetch { url, accept } => {
            let request = Request::get(&url)?.with_accept(&accept);
            let routed = layer.fetch(&request).await?;
            println!(
                "{} {} via {}",
                routed.response.status,
                routed.class.as_str(),
                routed.source.as_str()
            );
            if let Some(cached_at) = routed.cached_at {
                println!("Cached at: {}", cached_at.to_rfc3339());
            }
            println!("{}", routed.response.body_text());
        }
        Command::Save { endpoint, json } => {
            let payload = cli::parse_payload_arg(&json)?;
            match layer.save(&endpoint, payload).await? {
                SaveOutcome::Sent(response) => {
                    println!("Sent: backend answered {}", response.status)
                }
                SaveOutcome::Queued(entry) => {
                    println!("Queued as {} for later sync", entry.id)
                }
            }
        }
        Command::Sync => {
            // The drain only fires once the backend answers the health probe
            if !layer.is_online().await {
                println!(
                    "Backend unreachable; {} write(s) remain queued",
                    layer.queue().len()?
                );
            } else {
                let report = layer.sync().await?;
                println!(
                    "Synced {} write(s), {} still queued",
                    report.synced.len(),
                    report.failed.len()
                );
                for entry in &report.synced {
                    println!("  sent: {} -> {}", entry.id, entry.endpoint);
                }
                for id in &report.failed {
                    println!("  kept: {id}");
                }
            }
        }
        Command::Message { json } => {
            let message = cli::parse_message_arg(&json)?;
            let reply = layer.handle_message(message)?;
            println!("{}", serde_json::to_string_pretty(&reply)?);
        }
    }

    Ok(())
}

//! ipcache - producer/consumer demo for the address cache
//!
//! Offers the addresses given on the command line from a producer task and
//! drains them with `take` until Ctrl+C, printing one JSON line per address.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use serde_json::json;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ipcache::{Address, AddressCache, CacheError, Config};

/// Addresses offered when none are given on the command line.
const SAMPLE_ADDRESSES: &[&str] = &["10.107.1.1", "gateway/10.107.1.2", "10.107.1.3", "::1"];

/// Delay between two offers from the producer.
const PRODUCER_DELAY: Duration = Duration::from_millis(500);

/// Main entry point for the address cache demo.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load configuration from environment variables
/// 3. Create the address cache (starts the expiry sweeper when a TTL is set)
/// 4. Spawn the producer offering the requested addresses
/// 5. Take addresses until Ctrl+C cancels the pending take
/// 6. Close the cache
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ipcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting ipcache demo");

    let config = Config::from_env();
    info!(
        "Configuration loaded: capacity={}, ttl={}ms, sweep_interval={}ms",
        config.capacity, config.ttl_ms, config.sweep_interval_ms
    );

    let addresses = parse_addresses(std::env::args().skip(1))?;

    let cache = Arc::new(AddressCache::new(config).context("failed to create address cache")?);
    info!("Address cache initialized");

    let producer = tokio::spawn(produce(cache.clone(), addresses));

    loop {
        match cache.take_until(signal::ctrl_c()).await {
            Ok(address) => {
                let line = json!({
                    "address": address,
                    "remaining": cache.len(),
                    "taken_at": chrono::Utc::now().to_rfc3339(),
                });
                println!("{line}");
            }
            Err(CacheError::Cancelled) => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    producer.abort();
    cache.close();
    info!("Shutdown complete");

    Ok(())
}

/// Parses command line addresses, falling back to the sample set.
fn parse_addresses(args: impl Iterator<Item = String>) -> anyhow::Result<Vec<Address>> {
    let mut addresses = args
        .map(|arg| arg.parse::<Address>().with_context(|| format!("bad address {arg:?}")))
        .collect::<anyhow::Result<Vec<_>>>()?;

    if addresses.is_empty() {
        addresses = SAMPLE_ADDRESSES
            .iter()
            .map(|text| text.parse::<Address>())
            .collect::<ipcache::Result<Vec<_>>>()?;
    }

    Ok(addresses)
}

/// Offers each address in turn, pausing between offers.
async fn produce(cache: Arc<AddressCache>, addresses: Vec<Address>) {
    for address in addresses {
        tokio::time::sleep(PRODUCER_DELAY).await;
        if !cache.offer(address.clone()) {
            warn!("Cache full, dropped {}", address);
        }
    }
    info!("Producer finished, press Ctrl+C to exit");
}

//! TTL Expiry Sweeper
//!
//! Background task that periodically evicts cached addresses idle for longer
//! than the configured TTL.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Weak;
use std::time::{Duration, Instant};

use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use crate::cache::Shared;

/// Spawns a background task that sweeps expired addresses every `interval`.
///
/// The task holds only a weak reference to the cache state and exits on the
/// first tick after the cache is dropped. Each tick takes the cache guard,
/// scans the whole store and evicts every entry older than the TTL. A tick
/// that panics is logged and the loop carries on with the next one.
///
/// # Returns
/// A JoinHandle for the spawned task, aborted by the cache on close or drop.
pub(crate) fn spawn_sweeper_task(
    runtime: &Handle,
    shared: Weak<Shared>,
    interval: Duration,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        info!(
            "Starting expiry sweeper with interval of {} ms",
            interval.as_millis()
        );

        let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(state) = shared.upgrade() else {
                debug!("Address cache dropped, expiry sweeper exiting");
                break;
            };

            let outcome = panic::catch_unwind(AssertUnwindSafe(|| state.sweep(Instant::now())));

            match outcome {
                Ok(0) => debug!("Expiry sweep: no expired addresses found"),
                Ok(removed) => info!("Expiry sweep: removed {} expired addresses", removed),
                Err(_) => error!("Expiry sweep failed, retrying on next tick"),
            }
        }
    })
}

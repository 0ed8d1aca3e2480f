//! Cache Store Module
//!
//! Thread-safe address cache: a single mutex guards the recency store, and a
//! `Notify` wakes tasks waiting in `take` when an address is offered.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
#[cfg(test)]
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::cache::{Address, RecencyStore, DEFAULT_CAPACITY};
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::tasks::spawn_sweeper_task;

// == Shared State ==
/// State shared between the cache handle and its sweeper task.
#[derive(Debug)]
pub(crate) struct Shared {
    /// The one guard over all cache state
    store: Mutex<RecencyStore>,
    /// Signalled whenever an offer succeeds
    not_empty: Notify,
    /// Entry time-to-live, zero when expiry is disabled
    ttl: Duration,
    /// Makes the next sweep panic
    #[cfg(test)]
    fail_next_sweep: AtomicBool,
}

impl Shared {
    pub(crate) fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            store: Mutex::new(RecencyStore::new(capacity)),
            not_empty: Notify::new(),
            ttl,
            #[cfg(test)]
            fail_next_sweep: AtomicBool::new(false),
        }
    }

    // == Sweep ==
    /// Evicts expired entries under the guard. Returns the number removed.
    pub(crate) fn sweep(&self, now: Instant) -> usize {
        #[cfg(test)]
        {
            if self.fail_next_sweep.swap(false, Ordering::SeqCst) {
                panic!("sweep failure requested by test");
            }
        }

        if self.ttl.is_zero() {
            return 0;
        }
        self.store.lock().evict_expired(self.ttl, now)
    }
}

// == Address Cache ==
/// Bounded, thread-safe address cache with recency tracking and optional TTL.
///
/// Retrieval (`peek`, `remove_most_recent`, `take`) works on the most recently
/// touched address. Only the background sweep removes entries by age. A full
/// cache rejects new addresses instead of evicting old ones.
pub struct AddressCache {
    shared: Arc<Shared>,
    /// Background expiry task, present while a TTL is configured and the cache is open
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl AddressCache {
    // == Constructors ==
    /// Creates a cache from a validated configuration.
    ///
    /// With a positive TTL this spawns the expiry sweeper, which requires a
    /// running tokio runtime.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared::new(config.capacity, config.ttl()));

        let sweeper = if config.expiry_enabled() {
            let runtime = tokio::runtime::Handle::try_current()
                .map_err(|e| CacheError::Runtime(e.to_string()))?;
            Some(spawn_sweeper_task(
                &runtime,
                Arc::downgrade(&shared),
                config.sweep_interval(),
            ))
        } else {
            None
        };

        debug!(
            capacity = config.capacity,
            ttl_ms = config.ttl_ms,
            "Address cache created"
        );

        Ok(Self {
            shared,
            sweeper: Mutex::new(sweeper),
        })
    }

    /// Creates a cache with the given capacity and no expiry.
    pub fn with_capacity(capacity: usize) -> Result<Self> {
        Self::new(Config::new(capacity, 0))
    }

    pub fn capacity(&self) -> usize {
        self.shared.store.lock().capacity()
    }

    /// Configured entry time-to-live.
    ///
    /// Keeps reporting the configured value after [`close`](Self::close), even
    /// though expiry has stopped; use [`is_sweeping`](Self::is_sweeping) to
    /// see whether the sweeper is still running.
    pub fn ttl(&self) -> Duration {
        self.shared.ttl
    }

    // == Offer ==
    /// Adds an address, or refreshes it if already cached.
    ///
    /// Returns false when the address is new and the cache is full. Nothing is
    /// evicted to make room.
    pub fn offer(&self, address: Address) -> bool {
        let outcome = self.shared.store.lock().touch(address, Instant::now());

        if outcome.accepted() {
            self.shared.not_empty.notify_one();
            trace!(?outcome, "Address offered");
        } else {
            debug!("Cache full, address rejected");
        }
        outcome.accepted()
    }

    // == Contains ==
    pub fn contains(&self, address: &Address) -> bool {
        self.shared.store.lock().contains(address)
    }

    // == Remove ==
    /// Removes the address with the same identity. Returns true if one was cached.
    pub fn remove(&self, address: &Address) -> bool {
        self.shared.store.lock().remove(address).is_some()
    }

    // == Peek ==
    /// Returns the most recently touched address without removing it.
    pub fn peek(&self) -> Option<Address> {
        self.shared.store.lock().peek_most_recent().cloned()
    }

    // == Remove Most Recent ==
    /// Removes and returns the most recently touched address.
    pub fn remove_most_recent(&self) -> Option<Address> {
        self.shared.store.lock().pop_most_recent()
    }

    // == Take ==
    /// Waits until the cache holds an address, then removes and returns the
    /// most recently touched one.
    ///
    /// Dropping the future cancels the wait without removing anything. A
    /// wake-up that finds the cache empty again goes back to waiting.
    ///
    /// A plain thread outside the runtime blocks on it with
    /// `Handle::block_on(cache.take())`; the wait itself needs no runtime.
    pub async fn take(&self) -> Address {
        loop {
            // Register interest before checking so an offer landing between
            // the check and the await is not missed.
            let notified = self.shared.not_empty.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(address) = self.remove_most_recent() {
                return address;
            }

            notified.await;
        }
    }

    /// Like [`take`](Self::take), but gives up when `cancel` completes first.
    ///
    /// Returns [`CacheError::Cancelled`] on cancellation; no address is removed.
    pub async fn take_until<F>(&self, cancel: F) -> Result<Address>
    where
        F: Future,
    {
        tokio::select! {
            biased;
            address = self.take() => Ok(address),
            _ = cancel => {
                debug!("Pending take cancelled");
                Err(CacheError::Cancelled)
            }
        }
    }

    /// Like [`take`](Self::take), but returns `None` once `timeout` elapses.
    pub async fn take_timeout(&self, timeout: Duration) -> Option<Address> {
        tokio::time::timeout(timeout, self.take()).await.ok()
    }

    // == Close ==
    /// Drops every cached address and stops the expiry sweeper.
    ///
    /// Idempotent. Tasks already waiting in `take` are not woken; cancel them
    /// to stop waiting on a closed cache.
    pub fn close(&self) {
        if let Some(handle) = self.sweeper.lock().take() {
            handle.abort();
            debug!("Expiry sweeper stopped");
        }
        self.shared.store.lock().clear();
    }

    // == Length ==
    /// Returns the number of cached addresses.
    pub fn len(&self) -> usize {
        self.shared.store.lock().len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.shared.store.lock().is_empty()
    }

    /// Snapshot of cached addresses, most recently touched first.
    pub fn snapshot(&self) -> Vec<Address> {
        self.shared.store.lock().iter().cloned().collect()
    }

    /// Makes the sweeper's next tick panic.
    #[cfg(test)]
    pub(crate) fn fail_next_sweep(&self) {
        self.shared.fail_next_sweep.store(true, Ordering::SeqCst);
    }

    /// True until a requested sweep failure has been consumed by a tick.
    #[cfg(test)]
    pub(crate) fn sweep_failure_pending(&self) -> bool {
        self.shared.fail_next_sweep.load(Ordering::SeqCst)
    }

    /// Returns true while the expiry sweeper task is alive.
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }
}

impl Default for AddressCache {
    /// Capacity 10, no expiry.
    fn default() -> Self {
        Self {
            shared: Arc::new(Shared::new(DEFAULT_CAPACITY, Duration::ZERO)),
            sweeper: Mutex::new(None),
        }
    }
}

impl Drop for AddressCache {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.get_mut().take() {
            handle.abort();
        }
    }
}

impl fmt::Debug for AddressCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let store = self.shared.store.lock();
        f.debug_struct("AddressCache")
            .field("capacity", &store.capacity())
            .field("len", &store.len())
            .field("ttl", &self.shared.ttl)
            .finish()
    }
}

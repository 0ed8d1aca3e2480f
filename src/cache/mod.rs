//! Cache Module
//!
//! Provides a bounded address cache with recency ordering, blocking take and TTL expiry.

mod address;
mod entry;
mod recency;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use address::Address;
pub use entry::{CacheEntry, SlotHandle};
pub use recency::{Iter, RecencyStore, Touch};
pub use store::AddressCache;

pub(crate) use store::Shared;

// == Public Constants ==
/// Capacity used when none is configured
pub const DEFAULT_CAPACITY: usize = 10;

/// Expiry sweep period used when none is configured, in milliseconds
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 5_000;

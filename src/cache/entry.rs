//! Cache Entry Module
//!
//! Defines the record stored for each cached address, including its recency links.

use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::cache::Address;

/// Handle of an arena slot inside the recency store.
pub type SlotHandle = usize;

// == Cache Entry ==
/// One cached address with its last-touch time and recency neighbours.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Identity key, always equal to `value.key()`
    pub key: IpAddr,
    /// The stored address
    pub value: Address,
    /// Last time the address was offered
    pub touched_at: Instant,
    /// Neighbour towards the most recent end
    pub prev: Option<SlotHandle>,
    /// Neighbour towards the least recent end
    pub next: Option<SlotHandle>,
}

impl CacheEntry {
    // == Constructor ==
    /// Creates a detached entry touched at `now`.
    pub fn new(value: Address, now: Instant) -> Self {
        Self {
            key: value.key(),
            value,
            touched_at: now,
            prev: None,
            next: None,
        }
    }

    // == Touch ==
    /// Replaces the stored value with an equal address and refreshes the timestamp.
    pub fn touch(&mut self, value: Address, now: Instant) {
        debug_assert_eq!(self.key, value.key());
        self.value = value;
        self.touched_at = now;
    }

    // == Is Expired ==
    /// Checks if the entry has outlived `ttl` at `now`.
    ///
    /// Boundary condition: an entry touched exactly `ttl` ago is still alive;
    /// it expires once its age strictly exceeds the TTL.
    pub fn is_expired(&self, ttl: Duration, now: Instant) -> bool {
        match self.touched_at.checked_add(ttl) {
            Some(deadline) => deadline < now,
            None => false,
        }
    }
}

//! Recency Store Module
//!
//! Bounded address index with an arena-backed doubly-linked recency order.
//!
//! Entries live in a slot table and link to each other by slot handle, so the
//! list has no owning pointers. Head = most recently touched, tail = least
//! recently touched. The store has no locking of its own; `AddressCache` wraps
//! it in the cache's single mutex.

use std::collections::HashMap;
use std::net::IpAddr;
use std::time::{Duration, Instant};

use crate::cache::entry::{CacheEntry, SlotHandle};
use crate::cache::Address;

/// Upper bound on slots reserved up front; larger stores grow on demand.
const PREALLOCATED_SLOTS: usize = 64;

// == Touch Outcome ==
/// Result of offering an address to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Touch {
    /// A new entry was created at the head
    Inserted,
    /// An existing entry was refreshed and moved to the head
    Refreshed,
    /// The store was full and the address was not present
    Rejected,
}

impl Touch {
    /// True when the address is now cached.
    pub fn accepted(self) -> bool {
        !matches!(self, Touch::Rejected)
    }
}

// == Recency Store ==
/// Capacity-bounded map from address identity to entry, ordered by recency.
#[derive(Debug)]
pub struct RecencyStore {
    /// Maximum number of entries
    capacity: usize,
    /// Identity key to slot handle
    index: HashMap<IpAddr, SlotHandle>,
    /// Slot table, `None` marks a free slot
    slots: Vec<Option<CacheEntry>>,
    /// Free slot handles ready for reuse
    free: Vec<SlotHandle>,
    /// Most recently touched entry
    head: Option<SlotHandle>,
    /// Least recently touched entry
    tail: Option<SlotHandle>,
}

impl RecencyStore {
    // == Constructor ==
    /// Creates an empty store holding at most `capacity` entries.
    pub fn new(capacity: usize) -> Self {
        let reserved = capacity.min(PREALLOCATED_SLOTS);
        Self {
            capacity,
            index: HashMap::with_capacity(reserved),
            slots: Vec::with_capacity(reserved),
            free: Vec::new(),
            head: None,
            tail: None,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn is_full(&self) -> bool {
        self.index.len() >= self.capacity
    }

    // == Locate ==
    /// Finds the slot holding `key`.
    pub fn locate(&self, key: &IpAddr) -> Option<SlotHandle> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, address: &Address) -> bool {
        self.index.contains_key(&address.key())
    }

    // == Touch ==
    /// Offers an address at `now`.
    ///
    /// A present address is refreshed and promoted. An absent one is inserted
    /// at the head unless the store is full, in which case nothing changes.
    pub fn touch(&mut self, address: Address, now: Instant) -> Touch {
        if let Some(handle) = self.locate(&address.key()) {
            self.entry_mut(handle).touch(address, now);
            self.promote(handle);
            return Touch::Refreshed;
        }

        if self.is_full() {
            return Touch::Rejected;
        }

        let key = address.key();
        let handle = self.insert_at_head(CacheEntry::new(address, now));
        self.index.insert(key, handle);
        Touch::Inserted
    }

    // == Remove ==
    /// Removes the entry with the same identity as `address`.
    pub fn remove(&mut self, address: &Address) -> Option<Address> {
        let handle = self.index.remove(&address.key())?;
        Some(self.release(handle))
    }

    // == Most Recent ==
    /// Returns the most recently touched address without removing it.
    pub fn peek_most_recent(&self) -> Option<&Address> {
        self.head.map(|handle| &self.entry(handle).value)
    }

    /// Removes and returns the most recently touched address.
    pub fn pop_most_recent(&mut self) -> Option<Address> {
        let handle = self.head?;
        let key = self.entry(handle).key;
        self.index.remove(&key);
        Some(self.release(handle))
    }

    // == Evict Expired ==
    /// Removes every entry whose age at `now` exceeds `ttl`, wherever it sits.
    ///
    /// Returns the number of entries removed.
    pub fn evict_expired(&mut self, ttl: Duration, now: Instant) -> usize {
        let mut evicted = 0;
        let mut cursor = self.head;

        while let Some(handle) = cursor {
            let entry = self.entry(handle);
            cursor = entry.next;

            if entry.is_expired(ttl, now) {
                let key = entry.key;
                self.index.remove(&key);
                self.release(handle);
                evicted += 1;
            }
        }

        evicted
    }

    // == Clear ==
    /// Drops every entry and resets the slot table.
    pub fn clear(&mut self) {
        self.index.clear();
        self.slots.clear();
        self.free.clear();
        self.head = None;
        self.tail = None;
    }

    // == Iteration ==
    /// Iterates addresses from most to least recently touched.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            store: self,
            cursor: self.head,
        }
    }

    // == Linked List Operations ==

    /// Stores `entry` in a free slot and links it as the new head.
    ///
    /// The caller is responsible for recording the handle in the index.
    pub(crate) fn insert_at_head(&mut self, entry: CacheEntry) -> SlotHandle {
        let handle = match self.free.pop() {
            Some(handle) => {
                self.slots[handle] = Some(entry);
                handle
            }
            None => {
                self.slots.push(Some(entry));
                self.slots.len() - 1
            }
        };
        self.link_at_head(handle);
        handle
    }

    /// Detaches the entry at `handle` from the order, repairing neighbours and ends.
    pub(crate) fn unlink(&mut self, handle: SlotHandle) {
        let (prev, next) = {
            let entry = self.entry_mut(handle);
            (entry.prev.take(), entry.next.take())
        };

        match prev {
            Some(prev) => self.entry_mut(prev).next = next,
            None => self.head = next,
        }

        match next {
            Some(next) => self.entry_mut(next).prev = prev,
            None => self.tail = prev,
        }
    }

    /// Moves the entry at `handle` to the head.
    pub(crate) fn promote(&mut self, handle: SlotHandle) {
        if self.head == Some(handle) {
            return;
        }
        self.unlink(handle);
        self.link_at_head(handle);
    }

    fn link_at_head(&mut self, handle: SlotHandle) {
        let old_head = self.head;
        {
            let entry = self.entry_mut(handle);
            entry.prev = None;
            entry.next = old_head;
        }

        if let Some(old_head) = old_head {
            self.entry_mut(old_head).prev = Some(handle);
        }
        self.head = Some(handle);

        if self.tail.is_none() {
            self.tail = Some(handle);
        }
    }

    /// Unlinks the slot, frees it and hands back its address.
    ///
    /// The index entry must already be gone.
    fn release(&mut self, handle: SlotHandle) -> Address {
        self.unlink(handle);
        self.free.push(handle);
        match self.slots[handle].take() {
            Some(entry) => entry.value,
            None => unreachable!("released a vacant slot {handle}"),
        }
    }

    fn entry(&self, handle: SlotHandle) -> &CacheEntry {
        match self.slots[handle].as_ref() {
            Some(entry) => entry,
            None => unreachable!("dangling slot handle {handle}"),
        }
    }

    fn entry_mut(&mut self, handle: SlotHandle) -> &mut CacheEntry {
        match self.slots[handle].as_mut() {
            Some(entry) => entry,
            None => unreachable!("dangling slot handle {handle}"),
        }
    }

    /// Walks the whole structure and panics on any broken invariant.
    #[cfg(test)]
    pub(crate) fn assert_consistent(&self) {
        assert!(self.index.len() <= self.capacity, "index exceeds capacity");
        assert_eq!(self.head.is_none(), self.tail.is_none(), "ends disagree");
        assert_eq!(self.head.is_none(), self.index.is_empty(), "empty mismatch");

        let mut seen = 0;
        let mut prev = None;
        let mut cursor = self.head;
        while let Some(handle) = cursor {
            let entry = self.entry(handle);
            assert_eq!(entry.prev, prev, "broken back link at slot {handle}");
            assert_eq!(self.index.get(&entry.key), Some(&handle), "orphan slot {handle}");
            assert_eq!(entry.key, entry.value.key(), "key/value mismatch");
            seen += 1;
            assert!(seen <= self.index.len(), "cycle in recency order");
            prev = Some(handle);
            cursor = entry.next;
        }
        assert_eq!(prev, self.tail, "tail is not the last node");
        assert_eq!(seen, self.index.len(), "index has unlinked entries");
    }
}

// == Iterator ==
/// Most-to-least recent iterator over a [`RecencyStore`].
pub struct Iter<'a> {
    store: &'a RecencyStore,
    cursor: Option<SlotHandle>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Address;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.store.entry(self.cursor?);
        self.cursor = entry.next;
        Some(&entry.value)
    }
}

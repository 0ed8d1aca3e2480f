//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the recency store and the guarded cache against a
//! simple vector model of the expected behaviour.

use proptest::prelude::*;
use std::net::{IpAddr, Ipv4Addr};
use std::time::{Duration, Instant};

use crate::cache::{Address, AddressCache, RecencyStore, Touch};

// == Test Configuration ==
const TEST_CAPACITY: usize = 8;

// == Strategies ==
/// Generates addresses from a small pool so that re-offers and collisions are common
fn address_strategy() -> impl Strategy<Value = Address> {
    (0u8..16).prop_map(|last| Address::new(IpAddr::V4(Ipv4Addr::new(10, 107, 1, last))))
}

/// Generates a sequence of cache operations for testing
#[derive(Debug, Clone)]
enum CacheOp {
    Offer(Address),
    Remove(Address),
    RemoveMostRecent,
    Peek,
    Contains(Address),
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        3 => address_strategy().prop_map(CacheOp::Offer),
        1 => address_strategy().prop_map(CacheOp::Remove),
        1 => Just(CacheOp::RemoveMostRecent),
        1 => Just(CacheOp::Peek),
        1 => address_strategy().prop_map(CacheOp::Contains),
    ]
}

// == Reference Model ==
/// Most recent first.
#[derive(Debug, Default)]
struct Model {
    order: Vec<Address>,
}

impl Model {
    fn offer(&mut self, address: Address, capacity: usize) -> bool {
        if let Some(pos) = self.order.iter().position(|a| *a == address) {
            self.order.remove(pos);
            self.order.insert(0, address);
            return true;
        }
        if self.order.len() >= capacity {
            return false;
        }
        self.order.insert(0, address);
        true
    }

    fn remove(&mut self, address: &Address) -> bool {
        match self.order.iter().position(|a| a == address) {
            Some(pos) => {
                self.order.remove(pos);
                true
            }
            None => false,
        }
    }

    fn pop(&mut self) -> Option<Address> {
        if self.order.is_empty() {
            None
        } else {
            Some(self.order.remove(0))
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // **Property 1: Model Agreement**
    // *For any* sequence of operations, the cache returns what the vector model
    // returns and keeps the same recency order.
    #[test]
    fn prop_matches_model(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let cache = AddressCache::with_capacity(TEST_CAPACITY).unwrap();
        let mut model = Model::default();

        for op in ops {
            match op {
                CacheOp::Offer(address) => {
                    prop_assert_eq!(cache.offer(address.clone()), model.offer(address, TEST_CAPACITY));
                }
                CacheOp::Remove(address) => {
                    prop_assert_eq!(cache.remove(&address), model.remove(&address));
                }
                CacheOp::RemoveMostRecent => {
                    prop_assert_eq!(cache.remove_most_recent(), model.pop());
                }
                CacheOp::Peek => {
                    prop_assert_eq!(cache.peek(), model.order.first().cloned());
                }
                CacheOp::Contains(address) => {
                    prop_assert_eq!(cache.contains(&address), model.order.contains(&address));
                }
            }
            prop_assert_eq!(cache.len(), model.order.len());
            prop_assert_eq!(cache.is_empty(), model.order.is_empty());
        }

        prop_assert_eq!(cache.snapshot(), model.order);
    }

    // **Property 2: Structural Invariants**
    // *For any* sequence of operations, the index and the linked order hold
    // exactly the same entries, the ends are consistent and the size never
    // exceeds capacity.
    #[test]
    fn prop_store_invariants(ops in prop::collection::vec(cache_op_strategy(), 1..80)) {
        let mut store = RecencyStore::new(TEST_CAPACITY);
        let now = Instant::now();

        for op in ops {
            match op {
                CacheOp::Offer(address) => {
                    store.touch(address, now);
                }
                CacheOp::Remove(address) => {
                    store.remove(&address);
                }
                CacheOp::RemoveMostRecent => {
                    store.pop_most_recent();
                }
                CacheOp::Peek | CacheOp::Contains(_) => {}
            }
            store.assert_consistent();
            prop_assert!(store.len() <= TEST_CAPACITY);
        }
    }

    // **Property 3: Capacity Enforcement**
    // *For any* set of distinct addresses, offers succeed up to capacity and
    // every further new address is rejected without evicting anything.
    #[test]
    fn prop_capacity_enforcement(
        lasts in prop::collection::hash_set(0u8..=255, 1..40),
        capacity in 1usize..16
    ) {
        let cache = AddressCache::with_capacity(capacity).unwrap();
        let addresses: Vec<Address> = lasts
            .into_iter()
            .map(|last| Address::new(IpAddr::V4(Ipv4Addr::new(192, 168, 0, last))))
            .collect();

        for (i, address) in addresses.iter().enumerate() {
            let accepted = cache.offer(address.clone());
            prop_assert_eq!(accepted, i < capacity, "offer #{} of {}", i, address);
            prop_assert_eq!(cache.len(), (i + 1).min(capacity));
        }

        for address in addresses.iter().take(capacity) {
            prop_assert!(cache.contains(address), "{} should not be evicted", address);
        }
    }

    // **Property 4: Re-offer Promotes**
    // *For any* filled cache, re-offering a present address keeps the size and
    // makes it the next address returned.
    #[test]
    fn prop_reoffer_promotes(
        lasts in prop::collection::hash_set(0u8..=255, 2..TEST_CAPACITY),
        pick in any::<prop::sample::Index>()
    ) {
        let cache = AddressCache::with_capacity(TEST_CAPACITY).unwrap();
        let addresses: Vec<Address> = lasts
            .into_iter()
            .map(|last| Address::new(IpAddr::V4(Ipv4Addr::new(172, 16, 0, last))))
            .collect();
        for address in &addresses {
            cache.offer(address.clone());
        }

        let chosen = pick.get(&addresses).clone();
        let before = cache.len();

        prop_assert!(cache.offer(chosen.clone()));
        prop_assert_eq!(cache.len(), before);
        prop_assert_eq!(cache.peek(), Some(chosen.clone()));
        prop_assert_eq!(cache.remove_most_recent(), Some(chosen));
    }

    // **Property 5: Sweep Removes Exactly The Stale Entries**
    // *For any* assignment of touch times, a sweep at `now` removes precisely the
    // entries older than the TTL and keeps the relative order of the rest.
    #[test]
    fn prop_sweep_selects_by_age(ages in prop::collection::vec(0u64..2_000, 1..TEST_CAPACITY)) {
        let ttl = Duration::from_millis(1_000);
        let now = Instant::now() + Duration::from_millis(2_000);
        let mut store = RecencyStore::new(TEST_CAPACITY);

        let mut expected = Vec::new();
        for (i, age) in ages.iter().enumerate() {
            let address = Address::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, i as u8)));
            let touched = now - Duration::from_millis(*age);
            prop_assert_eq!(store.touch(address.clone(), touched), Touch::Inserted);
            if Duration::from_millis(*age) <= ttl {
                expected.insert(0, address);
            }
        }

        let evicted = store.evict_expired(ttl, now);

        prop_assert_eq!(evicted, ages.len() - expected.len());
        prop_assert_eq!(store.iter().cloned().collect::<Vec<_>>(), expected);
        store.assert_consistent();
    }
}

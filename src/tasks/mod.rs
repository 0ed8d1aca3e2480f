//! Background Tasks Module
//!
//! Contains background tasks that run alongside an address cache.
//!
//! # Tasks
//! - Expiry Sweep: Removes addresses idle for longer than the TTL at a fixed period

mod sweeper;

pub(crate) use sweeper::spawn_sweeper_task;

//! ipcache - A bounded in-process address cache
//!
//! Tracks recency of use, supports blocking retrieval for producer/consumer
//! usage and optionally expires idle addresses after a time-to-live.

pub mod cache;
pub mod config;
pub mod error;
mod tasks;

pub use cache::{Address, AddressCache};
pub use config::Config;
pub use error::{CacheError, Result};

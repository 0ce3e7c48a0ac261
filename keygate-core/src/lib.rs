//! # Keygate Core
//!
//! Core building blocks for the keygate library: a registry of lazily created
//! per-key locks and a cache-aside populator that runs at most one generation
//! per key at a time.
//!
//! ## Features
//!
//! - **Per-key locks**: One blocking mutex and, independently, one binary
//!   semaphore per string key, created on first use without races
//! - **Single-flight population**: Concurrent misses on a key share one
//!   generator run instead of repeating it
//! - **Blocking and async flavors**: `parking_lot` locks for threads, `tokio`
//!   semaphores for tasks
//! - **Pluggable stores**: Any [`CacheStore`] works; [`MemoryStore`] is bundled
//! - **Statistics**: Optional hit/generation counters (with `stats` feature)
//!
//! ## Module Organization
//!
//! - [`registry`] - Lock registry and the "run under lock" helpers
//! - [`populator`] - Single-flight cache-aside lookups
//! - [`store`] - The store seam and its options
//! - [`memory_store`] - Concurrent in-memory store with TTL expiry
//! - [`cache_entry`] - Entry wrapper with expiry bookkeeping
//!
//! ## Example
//!
//! ```
//! use keygate_core::{CachePopulator, LockRegistry, MemoryStore, StoreOptions};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let registry = Arc::new(LockRegistry::new());
//! let reports = CachePopulator::with_registry(registry, MemoryStore::<u64>::new());
//! let options = StoreOptions::new().with_ttl(Duration::from_secs(60));
//!
//! let total: Result<u64, _> = reports.retrieve(
//!     "report-2024",
//!     || "42".parse::<u64>(),
//!     &options,
//! );
//! assert_eq!(total.unwrap(), 42);
//! ```
pub mod cache_entry;
mod error;
pub mod memory_store;
pub mod populator;
pub mod registry;
pub mod store;

#[cfg(feature = "stats")]
mod stats;

pub use cache_entry::CacheEntry;
pub use error::{RegistryError, RetrieveError, StoreError};
pub use memory_store::MemoryStore;
pub use populator::CachePopulator;
pub use registry::{ExclusiveLock, KeySemaphore, LockRegistry};
pub use store::{CacheStore, StoreOptions};

#[cfg(feature = "stats")]
pub use stats::PopulatorStats;

//! # Keygate
//!
//! Per-key mutual exclusion and single-flight cache population for Rust.
//!
//! Two pieces work together:
//!
//! - [`LockRegistry`] hands out one lock per string key, created on first
//!   use. Blocking callers get a `parking_lot` mutex; async callers get a
//!   one-permit `tokio` semaphore from a separate pool.
//! - [`CachePopulator`] reads a [`CacheStore`], and on a miss makes sure only
//!   one caller per key runs the expensive generator while the rest wait and
//!   then read what it stored.
//!
//! ## Quick Start
//!
//! ```rust
//! use keygate::{CachePopulator, LockRegistry, MemoryStore, StoreOptions};
//! use std::convert::Infallible;
//! use std::sync::Arc;
//!
//! #[derive(Clone, Debug, PartialEq)]
//! struct Report {
//!     total: u32,
//! }
//!
//! let registry = Arc::new(LockRegistry::new());
//! let reports = CachePopulator::with_registry(registry, MemoryStore::<Report>::new());
//!
//! let report = reports
//!     .retrieve(
//!         "report-2024",
//!         || Ok::<_, Infallible>(Report { total: 42 }),
//!         &StoreOptions::new(),
//!     )
//!     .unwrap();
//! assert_eq!(report.total, 42);
//! ```
//!
//! ## Key-Scoped Exclusion Without Caching
//!
//! ```rust
//! use keygate::LockRegistry;
//!
//! let registry = LockRegistry::new();
//! let balance = registry.run_exclusive("account:17", || {
//!     // read-modify-write that must not interleave for this account
//!     100 - 25
//! });
//! assert_eq!(balance.unwrap(), 75);
//! ```
//!
//! ## Error Handling
//!
//! Generators return `Result`. A failed generation is reported to the caller
//! that ran it and nothing is stored, so the next caller tries again:
//!
//! ```rust
//! use keygate::{CachePopulator, LockRegistry, MemoryStore, StoreOptions};
//! use std::sync::Arc;
//!
//! let rates = CachePopulator::with_registry(
//!     Arc::new(LockRegistry::new()),
//!     MemoryStore::<f64>::new(),
//! );
//!
//! let failed = rates.retrieve("eur-usd", || Err("upstream down"), &StoreOptions::new());
//! assert!(failed.unwrap_err().is_generator());
//!
//! let rate = rates.retrieve("eur-usd", || Ok::<_, &str>(1.08), &StoreOptions::new());
//! assert_eq!(rate.unwrap(), 1.08);
//! ```
//!
//! ## Blocking vs Async Callers
//!
//! The blocking and async flavors lock through independent pools. A blocking
//! and an async lookup of the same key can both generate; route each key
//! through one flavor. See `keygate-async` for the async entry points.

pub use keygate_core::*;

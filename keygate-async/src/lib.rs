//! # Keygate Async
//!
//! Async entry points for keygate: key-scoped exclusion and single-flight
//! cache population for `async`/`await` code.
//!
//! Waiting on a key suspends the task on a one-permit `tokio` semaphore
//! instead of blocking a thread, so many tasks can queue on a hot key
//! cheaply.
//!
//! ## Examples
//!
//! ```rust
//! use keygate_async::prelude::*;
//! use std::convert::Infallible;
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() {
//! let users = CachePopulator::with_registry(
//!     Arc::new(LockRegistry::new()),
//!     MemoryStore::<String>::new(),
//! );
//!
//! let name = users
//!     .retrieve_async(
//!         "user:1",
//!         || async {
//!             tokio::time::sleep(Duration::from_millis(10)).await;
//!             Ok::<_, Infallible>("Ada".to_string())
//!         },
//!         &StoreOptions::new().with_ttl(Duration::from_secs(30)),
//!     )
//!     .await
//!     .unwrap();
//! assert_eq!(name, "Ada");
//! # }
//! ```
//!
//! ## Thread Safety
//!
//! Populators are cheap to clone and can move into spawned tasks. Clones
//! share the registry, the store, and the statistics.
//!
//! The semaphore pool is separate from the blocking lock pool: do not mix
//! `retrieve` and `retrieve_async` on the same key if only one generation
//! may ever run.

// Re-export the core types
pub use keygate_core::{
    CachePopulator, CacheStore, KeySemaphore, LockRegistry, MemoryStore, RegistryError,
    RetrieveError, StoreError, StoreOptions,
};

#[cfg(feature = "stats")]
pub use keygate_core::PopulatorStats;

// Re-export the runtime crate whose semaphore backs the async pool
pub use tokio;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        CachePopulator, CacheStore, LockRegistry, MemoryStore, RetrieveError, StoreOptions,
    };
}

use crate::RegistryError;
use dashmap::DashMap;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Handle to the blocking per-key lock.
pub type ExclusiveLock = Arc<Mutex<()>>;

/// Handle to the per-key binary semaphore used by async callers.
pub type KeySemaphore = Arc<Semaphore>;

static GLOBAL_REGISTRY: Lazy<Arc<LockRegistry>> = Lazy::new(|| Arc::new(LockRegistry::new()));

/// A registry of lazily created per-key exclusion primitives.
///
/// Each key maps to at most one [`ExclusiveLock`] for blocking callers and, in
/// a separate pool, at most one [`KeySemaphore`] (one permit) for async
/// callers. The two pools are independent: holding the exclusive lock for a
/// key does not exclude a holder of that key's semaphore.
///
/// # Thread Safety
///
/// Lookups of an existing primitive go through `DashMap` without touching the
/// registry-wide guard. Creation takes the guard and re-checks the map, so two
/// callers racing on a new key always receive the same primitive. The
/// primitives themselves are acquired and released without further
/// coordination from the registry.
///
/// # Growth
///
/// Entries are never removed on their own; memory grows with the number of
/// distinct keys ever seen. Deployments with unbounded key cardinality should
/// call [`prune_idle`](Self::prune_idle) periodically.
///
/// # Examples
///
/// ```
/// use keygate_core::LockRegistry;
///
/// let registry = LockRegistry::new();
///
/// let total = registry.run_exclusive("ledger:7", || 40 + 2).unwrap();
/// assert_eq!(total, 42);
///
/// // Same key, same primitive
/// let a = registry.exclusive_lock_for("ledger:7").unwrap();
/// let b = registry.exclusive_lock_for("ledger:7").unwrap();
/// assert!(std::sync::Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Default)]
pub struct LockRegistry {
    exclusive_locks: DashMap<String, ExclusiveLock>,
    async_locks: DashMap<String, KeySemaphore>,
    guard_lock: Mutex<()>,
}

impl LockRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry sized for `capacity` distinct keys per pool.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            exclusive_locks: DashMap::with_capacity(capacity),
            async_locks: DashMap::with_capacity(capacity),
            guard_lock: Mutex::new(()),
        }
    }

    /// Returns the process-wide registry, creating it on first use.
    ///
    /// Prefer constructing a registry at startup and passing it around;
    /// tests in particular should use their own instance.
    pub fn global() -> Arc<LockRegistry> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Returns the exclusive lock for `key`, creating it if absent.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyKey`] if `key` is empty.
    pub fn exclusive_lock_for(&self, key: &str) -> Result<ExclusiveLock, RegistryError> {
        self.primitive_for(&self.exclusive_locks, key, || Arc::new(Mutex::new(())))
    }

    /// Returns the binary semaphore for `key`, creating it with one permit if absent.
    ///
    /// # Errors
    ///
    /// [`RegistryError::EmptyKey`] if `key` is empty.
    pub fn semaphore_for(&self, key: &str) -> Result<KeySemaphore, RegistryError> {
        self.primitive_for(&self.async_locks, key, || Arc::new(Semaphore::new(1)))
    }

    /// Runs `action` while holding the exclusive lock for `key`.
    ///
    /// The calling thread blocks until the lock is acquired. The lock is
    /// released when `action` returns or unwinds. A fallible action reports
    /// its own error inside `T`.
    ///
    /// # Examples
    ///
    /// ```
    /// use keygate_core::LockRegistry;
    ///
    /// let registry = LockRegistry::new();
    /// let outcome: Result<Result<u32, String>, _> =
    ///     registry.run_exclusive("job", || Err("disk full".to_string()));
    ///
    /// assert_eq!(outcome.unwrap(), Err("disk full".to_string()));
    /// assert!(!registry.exclusive_lock_for("job").unwrap().is_locked());
    /// ```
    pub fn run_exclusive<T, F>(&self, key: &str, action: F) -> Result<T, RegistryError>
    where
        F: FnOnce() -> T,
    {
        let lock = self.exclusive_lock_for(key)?;
        let _held = lock.lock();
        Ok(action())
    }

    /// Runs the future produced by `action` while holding the semaphore for `key`.
    ///
    /// Waiting for the permit suspends the task without occupying a thread.
    /// The permit is returned when the future completes, and also when the
    /// returned future is dropped part way through.
    pub async fn run_exclusive_async<F, Fut>(
        &self,
        key: &str,
        action: F,
    ) -> Result<Fut::Output, RegistryError>
    where
        F: FnOnce() -> Fut,
        Fut: Future,
    {
        let semaphore = self.semaphore_for(key)?;
        let _permit = semaphore
            .acquire()
            .await
            .map_err(|_| RegistryError::SemaphoreClosed)?;
        Ok(action().await)
    }

    /// Number of keys with an exclusive lock.
    pub fn exclusive_len(&self) -> usize {
        self.exclusive_locks.len()
    }

    /// Number of keys with a semaphore.
    pub fn semaphore_len(&self) -> usize {
        self.async_locks.len()
    }

    /// Drops every primitive that no caller currently holds, waits on, or
    /// keeps a handle to. Returns the number of entries removed across both
    /// pools.
    ///
    /// A pruned key gets a fresh primitive on its next use. An entry is only
    /// removed while the registry owns the sole reference, so exclusivity for
    /// callers already inside a critical section is unaffected.
    pub fn prune_idle(&self) -> usize {
        let _guard = self.guard_lock.lock();
        let before = self.exclusive_locks.len() + self.async_locks.len();

        self.exclusive_locks
            .retain(|_, lock| Arc::strong_count(lock) > 1);
        self.async_locks
            .retain(|_, semaphore| Arc::strong_count(semaphore) > 1);

        let removed = before - (self.exclusive_locks.len() + self.async_locks.len());
        tracing::trace!(removed, "pruned idle lock primitives");
        removed
    }

    // Double-checked insert: lock-free read first, then re-check under the guard.
    fn primitive_for<P, C>(
        &self,
        pool: &DashMap<String, P>,
        key: &str,
        create: C,
    ) -> Result<P, RegistryError>
    where
        P: Clone,
        C: FnOnce() -> P,
    {
        if key.is_empty() {
            return Err(RegistryError::EmptyKey);
        }

        if let Some(existing) = pool.get(key) {
            return Ok(existing.value().clone());
        }

        let _guard = self.guard_lock.lock();
        if let Some(existing) = pool.get(key) {
            return Ok(existing.value().clone());
        }

        let created = create();
        pool.insert(key.to_owned(), created.clone());
        tracing::trace!(key, "created lock primitive");
        Ok(created)
    }
}

use crate::{CacheStore, LockRegistry, RegistryError, RetrieveError, StoreOptions};
use std::future::Future;
use std::sync::Arc;

#[cfg(feature = "stats")]
use crate::PopulatorStats;

/// Cache-aside lookups with at most one generation in flight per key.
///
/// Every lookup first reads the store without locking. On a miss the caller
/// takes the key's primitive from the [`LockRegistry`], reads the store again,
/// and only if the value is still missing runs the generator and writes the
/// result. Callers that queued behind the generating caller find the value
/// on their re-read.
///
/// # Blocking and async flavors
///
/// [`retrieve`](Self::retrieve) blocks on the key's exclusive lock.
/// [`retrieve_async`](Self::retrieve_async) suspends on the key's semaphore.
/// The two flavors draw from independent pools, so a blocking and an async
/// lookup of the same key do not exclude each other and may both generate.
/// Keep a given key on one flavor if that matters.
///
/// # Failures
///
/// A failed generator leaves the store untouched and releases the lock. The
/// next waiter finds the key still missing and generates on its own; failures
/// are neither cached nor retried internally.
///
/// # Type Parameters
///
/// * `S` - The backing store. Share one store (and one registry) between all
///   populators that must coordinate.
///
/// # Examples
///
/// ```
/// use keygate_core::{CachePopulator, LockRegistry, MemoryStore, StoreOptions};
/// use std::convert::Infallible;
/// use std::sync::Arc;
///
/// let populator = CachePopulator::with_registry(
///     Arc::new(LockRegistry::new()),
///     MemoryStore::<u64>::new(),
/// );
///
/// let first = populator
///     .retrieve("visits", || Ok::<_, Infallible>(41 + 1), &StoreOptions::new())
///     .unwrap();
/// let second = populator
///     .retrieve("visits", || Ok::<_, Infallible>(0), &StoreOptions::new())
///     .unwrap();
///
/// assert_eq!(first, 42);
/// assert_eq!(second, 42);
/// ```
#[derive(Debug, Clone)]
pub struct CachePopulator<S> {
    registry: Arc<LockRegistry>,
    store: S,
    #[cfg(feature = "stats")]
    stats: Arc<PopulatorStats>,
}

impl<S> CachePopulator<S> {
    /// Creates a populator that locks through the process-wide registry.
    pub fn new(store: S) -> Self {
        Self::with_registry(LockRegistry::global(), store)
    }

    /// Creates a populator that locks through `registry`.
    pub fn with_registry(registry: Arc<LockRegistry>, store: S) -> Self {
        Self {
            registry,
            store,
            #[cfg(feature = "stats")]
            stats: Arc::new(PopulatorStats::new()),
        }
    }

    /// Returns the registry this populator locks through.
    ///
    /// Useful for taking a key's lock by hand, or for sharing the registry
    /// with [`LockRegistry::run_exclusive`] callers that must exclude the
    /// same keys.
    pub fn registry(&self) -> &Arc<LockRegistry> {
        &self.registry
    }

    /// Returns the backing store.
    ///
    /// Reads and writes made directly on the store bypass the per-key lock.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Counters shared by this populator and its clones.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &PopulatorStats {
        &self.stats
    }

    /// Returns the stored value for `key`, generating and storing it on a miss.
    ///
    /// Blocks the calling thread while another caller generates the same key.
    ///
    /// # Errors
    ///
    /// * [`RetrieveError::Registry`] if `key` is empty
    /// * [`RetrieveError::Store`] if the store fails
    /// * [`RetrieveError::Generator`] with the generator's own error
    pub fn retrieve<T, E, G>(
        &self,
        key: &str,
        generator: G,
        options: &StoreOptions,
    ) -> Result<T, RetrieveError<E>>
    where
        S: CacheStore<T>,
        T: Clone,
        G: FnOnce() -> Result<T, E>,
    {
        self.retrieve_with(key, generator, options, |value| value)
    }

    /// Like [`retrieve`](Self::retrieve), passing a freshly generated value
    /// through `post_generate` before returning it.
    ///
    /// The store receives the value as generated. Only the caller that ran
    /// the generator sees the transformed value; every hit returns the stored
    /// value unchanged.
    pub fn retrieve_with<T, E, G, P>(
        &self,
        key: &str,
        generator: G,
        options: &StoreOptions,
        post_generate: P,
    ) -> Result<T, RetrieveError<E>>
    where
        S: CacheStore<T>,
        T: Clone,
        G: FnOnce() -> Result<T, E>,
        P: FnOnce(T) -> T,
    {
        if key.is_empty() {
            return Err(RegistryError::EmptyKey.into());
        }

        if let Some(value) = self.store.try_get(key)? {
            #[cfg(feature = "stats")]
            self.stats.record_fast_hit();
            return Ok(value);
        }

        let lock = self.registry.exclusive_lock_for(key)?;
        let held = lock.lock();

        if let Some(value) = self.store.try_get(key)? {
            tracing::debug!(key, "value populated while waiting for lock");
            #[cfg(feature = "stats")]
            self.stats.record_locked_hit();
            return Ok(value);
        }

        tracing::debug!(key, "generating value");
        #[cfg(feature = "stats")]
        self.stats.record_generation();
        let value = match generator() {
            Ok(value) => value,
            Err(err) => {
                #[cfg(feature = "stats")]
                self.stats.record_generator_failure();
                return Err(RetrieveError::Generator(err));
            }
        };
        self.store.set(key, value.clone(), options)?;
        drop(held);

        tracing::debug!(key, "stored generated value");
        Ok(post_generate(value))
    }

    /// Async counterpart of [`retrieve`](Self::retrieve).
    ///
    /// Waiting for the key and awaiting the generator both suspend the task
    /// instead of blocking its thread. Dropping the returned future releases
    /// the key.
    pub async fn retrieve_async<T, E, G, Fut>(
        &self,
        key: &str,
        generator: G,
        options: &StoreOptions,
    ) -> Result<T, RetrieveError<E>>
    where
        S: CacheStore<T>,
        T: Clone,
        G: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        self.retrieve_async_with(key, generator, options, |value| value)
            .await
    }

    /// Async counterpart of [`retrieve_with`](Self::retrieve_with).
    pub async fn retrieve_async_with<T, E, G, Fut, P>(
        &self,
        key: &str,
        generator: G,
        options: &StoreOptions,
        post_generate: P,
    ) -> Result<T, RetrieveError<E>>
    where
        S: CacheStore<T>,
        T: Clone,
        G: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        P: FnOnce(T) -> T,
    {
        if key.is_empty() {
            return Err(RegistryError::EmptyKey.into());
        }

        if let Some(value) = self.store.try_get(key)? {
            #[cfg(feature = "stats")]
            self.stats.record_fast_hit();
            return Ok(value);
        }

        let semaphore = self.registry.semaphore_for(key)?;
        let permit = semaphore
            .acquire()
            .await
            .map_err(|_| RegistryError::SemaphoreClosed)?;

        if let Some(value) = self.store.try_get(key)? {
            tracing::debug!(key, "value populated while waiting for permit");
            #[cfg(feature = "stats")]
            self.stats.record_locked_hit();
            return Ok(value);
        }

        tracing::debug!(key, "generating value");
        #[cfg(feature = "stats")]
        self.stats.record_generation();
        let value = match generator().await {
            Ok(value) => value,
            Err(err) => {
                #[cfg(feature = "stats")]
                self.stats.record_generator_failure();
                return Err(RetrieveError::Generator(err));
            }
        };
        self.store.set(key, value.clone(), options)?;
        drop(permit);

        tracing::debug!(key, "stored generated value");
        Ok(post_generate(value))
    }
}

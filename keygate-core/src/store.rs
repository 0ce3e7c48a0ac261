use crate::StoreError;
use std::sync::Arc;
use std::time::Duration;

/// Expiry and size policy handed to [`CacheStore::set`].
///
/// The populator forwards these options without looking at them; what they
/// mean is up to the store.
///
/// # Examples
///
/// ```
/// use keygate_core::StoreOptions;
/// use std::time::Duration;
///
/// let options = StoreOptions::new()
///     .with_ttl(Duration::from_secs(300))
///     .with_size(1024);
///
/// assert_eq!(options.ttl, Some(Duration::from_secs(300)));
/// assert_eq!(options.size, Some(1024));
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Time the value stays readable after being written.
    pub ttl: Option<Duration>,
    /// Caller-supplied size of the value, for stores that account for it.
    pub size: Option<usize>,
}

impl StoreOptions {
    /// Options with no expiry and no size hint.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets how long a written value stays readable.
    ///
    /// # Arguments
    ///
    /// * `ttl` - Time from the write after which the store treats the key as missing
    ///
    /// # Examples
    ///
    /// ```
    /// use keygate_core::StoreOptions;
    /// use std::time::Duration;
    ///
    /// let options = StoreOptions::new().with_ttl(Duration::from_secs(5));
    /// assert_eq!(options.ttl, Some(Duration::from_secs(5)));
    /// assert_eq!(options.size, None);
    /// ```
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Attaches a size hint for stores that account for value size.
    ///
    /// # Arguments
    ///
    /// * `size` - Caller's estimate of the value size, in whatever unit the store uses
    pub fn with_size(mut self, size: usize) -> Self {
        self.size = Some(size);
        self
    }
}

/// A key/value store the populator reads from and writes to.
///
/// Implementations must tolerate concurrent `try_get` and `set` calls from
/// many threads. The populator serializes nothing beyond the per-key critical
/// section around generation.
pub trait CacheStore<T>: Send + Sync {
    /// Looks up `key`. `Ok(None)` is a miss.
    fn try_get(&self, key: &str) -> Result<Option<T>, StoreError>;

    /// Writes `value` under `key` with the given options.
    fn set(&self, key: &str, value: T, options: &StoreOptions) -> Result<(), StoreError>;
}

impl<T, S> CacheStore<T> for Arc<S>
where
    S: CacheStore<T> + ?Sized,
{
    fn try_get(&self, key: &str) -> Result<Option<T>, StoreError> {
        (**self).try_get(key)
    }

    fn set(&self, key: &str, value: T, options: &StoreOptions) -> Result<(), StoreError> {
        (**self).set(key, value, options)
    }
}

impl<T, S> CacheStore<T> for &S
where
    S: CacheStore<T> + ?Sized,
{
    fn try_get(&self, key: &str) -> Result<Option<T>, StoreError> {
        (**self).try_get(key)
    }

    fn set(&self, key: &str, value: T, options: &StoreOptions) -> Result<(), StoreError> {
        (**self).set(key, value, options)
    }
}

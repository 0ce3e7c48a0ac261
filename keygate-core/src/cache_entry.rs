use std::time::{Duration, Instant};

/// A value held by [`MemoryStore`](crate::MemoryStore) together with its
/// expiry bookkeeping.
///
/// # Fields
///
/// * `value` - The stored value
/// * `inserted_at` - The `Instant` when this entry was written
/// * `ttl` - How long the entry stays readable (`None` for no expiry)
/// * `size` - Size hint supplied by the writer, if any
///
/// # Examples
///
/// ```
/// use keygate_core::CacheEntry;
/// use std::time::Duration;
///
/// let entry = CacheEntry::new(42, Some(Duration::from_secs(60)), None);
/// assert_eq!(entry.value, 42);
/// assert!(!entry.is_expired());
/// ```
#[derive(Clone, Debug)]
pub struct CacheEntry<T> {
    pub value: T,
    pub inserted_at: Instant,
    pub ttl: Option<Duration>,
    pub size: Option<usize>,
}

impl<T> CacheEntry<T> {
    /// Creates an entry stamped with the current time.
    pub fn new(value: T, ttl: Option<Duration>, size: Option<usize>) -> Self {
        Self {
            value,
            inserted_at: Instant::now(),
            ttl,
            size,
        }
    }

    /// Returns true once the entry has outlived its TTL.
    ///
    /// An entry without a TTL never expires.
    pub fn is_expired(&self) -> bool {
        match self.ttl {
            Some(ttl) => self.inserted_at.elapsed() >= ttl,
            None => false,
        }
    }
}

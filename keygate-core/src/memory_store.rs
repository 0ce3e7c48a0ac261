use crate::{CacheEntry, CacheStore, StoreError, StoreOptions};
use dashmap::DashMap;

/// A concurrent in-memory [`CacheStore`].
///
/// Entries are kept in a `DashMap` and honour [`StoreOptions::ttl`]: an
/// expired entry reads as a miss and is dropped on that read. There is no
/// capacity limit or eviction policy; entries stay until they expire, are
/// removed, or the store is cleared.
///
/// # Examples
///
/// ```
/// use keygate_core::{CacheStore, MemoryStore, StoreOptions};
///
/// let store = MemoryStore::new();
/// store.set("answer", 42, &StoreOptions::new()).unwrap();
///
/// assert_eq!(store.try_get("answer").unwrap(), Some(42));
/// assert_eq!(store.try_get("question").unwrap(), None);
/// ```
#[derive(Debug)]
pub struct MemoryStore<T> {
    entries: DashMap<String, CacheEntry<T>>,
}

impl<T> MemoryStore<T> {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Creates an empty store with room for `capacity` entries before it
    /// has to grow.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: DashMap::with_capacity(capacity),
        }
    }

    /// Removes `key`, returning whether an entry (expired or not) was present.
    pub fn remove(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Number of entries, including expired ones not yet read.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the store holds no entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use keygate_core::{CacheStore, MemoryStore, StoreOptions};
    ///
    /// let store = MemoryStore::new();
    /// assert!(store.is_empty());
    ///
    /// store.set("k", 1u8, &StoreOptions::new()).unwrap();
    /// assert!(!store.is_empty());
    /// ```
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes every entry.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<T> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CacheStore<T> for MemoryStore<T>
where
    T: Clone + Send + Sync,
{
    fn try_get(&self, key: &str) -> Result<Option<T>, StoreError> {
        let expired = match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
            Some(_) => true,
            None => false,
        };

        if expired {
            // A writer may have replaced the entry since the read above
            self.entries.remove_if(key, |_, entry| entry.is_expired());
        }
        Ok(None)
    }

    fn set(&self, key: &str, value: T, options: &StoreOptions) -> Result<(), StoreError> {
        self.entries.insert(
            key.to_owned(),
            CacheEntry::new(value, options.ttl, options.size),
        );
        Ok(())
    }
}

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters describing how a [`CachePopulator`](crate::CachePopulator)
/// served its requests.
///
/// All operations use atomic operations with `Relaxed` ordering; the counters
/// are for monitoring, not for synchronization.
///
/// # Examples
///
/// ```
/// use keygate_core::PopulatorStats;
///
/// let stats = PopulatorStats::new();
/// stats.record_fast_hit();
/// stats.record_fast_hit();
/// stats.record_locked_hit();
/// stats.record_generation();
///
/// assert_eq!(stats.hits(), 3);
/// assert_eq!(stats.total_requests(), 4);
/// assert!((stats.hit_rate() - 0.75).abs() < 0.001);
/// ```
#[derive(Debug, Default)]
pub struct PopulatorStats {
    fast_hits: AtomicU64,
    locked_hits: AtomicU64,
    generations: AtomicU64,
    generator_failures: AtomicU64,
}

impl PopulatorStats {
    /// Creates a `PopulatorStats` instance with zero counters.
    ///
    /// # Examples
    ///
    /// ```
    /// use keygate_core::PopulatorStats;
    ///
    /// let stats = PopulatorStats::new();
    /// assert_eq!(stats.generations(), 0);
    /// assert_eq!(stats.hits(), 0);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a value served by the lock-free first lookup.
    #[inline]
    pub fn record_fast_hit(&self) {
        self.fast_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a value found by the re-read under the per-key lock.
    #[inline]
    pub fn record_locked_hit(&self) {
        self.locked_hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a generator invocation, successful or not.
    #[inline]
    pub fn record_generation(&self) {
        self.generations.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a generator invocation that returned an error.
    ///
    /// The invocation itself is counted separately by
    /// [`record_generation`](Self::record_generation).
    #[inline]
    pub fn record_generator_failure(&self) {
        self.generator_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of values served by the first, unlocked lookup.
    #[inline]
    pub fn fast_hits(&self) -> u64 {
        self.fast_hits.load(Ordering::Relaxed)
    }

    /// Returns the number of values found by the re-read under the key's lock,
    /// i.e. written by another caller while this one waited.
    #[inline]
    pub fn locked_hits(&self) -> u64 {
        self.locked_hits.load(Ordering::Relaxed)
    }

    /// Returns the number of generator invocations, including failed ones.
    ///
    /// # Examples
    ///
    /// ```
    /// use keygate_core::PopulatorStats;
    ///
    /// let stats = PopulatorStats::new();
    /// stats.record_generation();
    /// stats.record_generation();
    /// stats.record_generator_failure();
    /// assert_eq!(stats.generations(), 2);
    /// assert_eq!(stats.generator_failures(), 1);
    /// ```
    #[inline]
    pub fn generations(&self) -> u64 {
        self.generations.load(Ordering::Relaxed)
    }

    /// Returns the number of generator invocations that returned an error.
    #[inline]
    pub fn generator_failures(&self) -> u64 {
        self.generator_failures.load(Ordering::Relaxed)
    }

    /// Requests answered from the store on either lookup.
    #[inline]
    pub fn hits(&self) -> u64 {
        self.fast_hits() + self.locked_hits()
    }

    /// Requests that reached a store lookup: hits plus generator invocations.
    #[inline]
    pub fn total_requests(&self) -> u64 {
        self.hits() + self.generations()
    }

    /// Fraction of requests served without generating (0.0 to 1.0).
    ///
    /// Returns 0.0 before any request.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_requests();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    /// Resets every counter to zero.
    ///
    /// Concurrent recordings during a reset may or may not survive it.
    pub fn reset(&self) {
        self.fast_hits.store(0, Ordering::Relaxed);
        self.locked_hits.store(0, Ordering::Relaxed);
        self.generations.store(0, Ordering::Relaxed);
        self.generator_failures.store(0, Ordering::Relaxed);
    }
}

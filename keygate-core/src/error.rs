use thiserror::Error;

/// Errors raised by [`LockRegistry`](crate::LockRegistry) itself.
///
/// The registry never fails on its own account except for programming errors
/// at the call site. Failures of the work run under a lock are returned to the
/// caller untouched and never pass through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The key was the empty string.
    #[error("lock key must not be empty")]
    EmptyKey,

    /// A per-key semaphore was closed while a caller waited on it.
    ///
    /// The registry never closes the semaphores it owns, so this is only
    /// reachable if a caller closes a handle obtained from
    /// [`LockRegistry::semaphore_for`](crate::LockRegistry::semaphore_for).
    #[error("semaphore for lock key was closed")]
    SemaphoreClosed,
}

/// Error raised by a [`CacheStore`](crate::CacheStore) implementation.
///
/// The populator carries it back to the caller verbatim. The original error is
/// available through [`std::error::Error::source`].
///
/// # Examples
///
/// ```
/// use keygate_core::StoreError;
///
/// let err = StoreError::msg("backend unavailable");
/// assert_eq!(err.to_string(), "store operation failed: backend unavailable");
/// ```
#[derive(Debug, Error)]
#[error("store operation failed: {source}")]
pub struct StoreError {
    source: Box<dyn std::error::Error + Send + Sync + 'static>,
}

impl StoreError {
    /// Wraps an arbitrary store backend error.
    pub fn new<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            source: Box::new(err),
        }
    }

    /// Builds a store error from a plain message.
    pub fn msg(message: impl Into<String>) -> Self {
        let message: String = message.into();
        Self {
            source: message.into(),
        }
    }
}

/// Error returned by [`CachePopulator`](crate::CachePopulator) lookups.
///
/// # Type Parameters
///
/// * `E` - The error type of the caller-supplied generator. Use
///   [`std::convert::Infallible`] for generators that cannot fail.
#[derive(Debug, Error)]
pub enum RetrieveError<E> {
    /// The key was rejected before any store or lock access.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// The store failed on read or write.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The generator failed. Nothing was written to the store.
    #[error("value generation failed")]
    Generator(#[source] E),
}

impl<E> RetrieveError<E> {
    /// Returns `true` if the failure came from the generator.
    pub fn is_generator(&self) -> bool {
        matches!(self, RetrieveError::Generator(_))
    }

    /// Returns the generator's own error, if that is what failed.
    pub fn into_generator_error(self) -> Option<E> {
        match self {
            RetrieveError::Generator(err) => Some(err),
            _ => None,
        }
    }
}

//! Atomically swappable single-value container.

use arc_swap::ArcSwap;
use std::fmt;
use std::sync::Arc;

/// Holds the current value of one flag.
///
/// Reads never block and never see a half-written value: every update
/// replaces the whole `Arc` in one atomic store.
pub struct ValueCell<T> {
    inner: ArcSwap<T>,
}

impl<T> ValueCell<T> {
    /// Create a cell holding `value`.
    pub fn new(value: T) -> Self {
        Self {
            inner: ArcSwap::from_pointee(value),
        }
    }

    /// Replace the current value.
    pub fn store(&self, value: T) {
        self.inner.store(Arc::new(value));
    }

    /// Shared pointer to the current value.
    pub fn load(&self) -> Arc<T> {
        self.inner.load_full()
    }
}

impl<T: Clone> ValueCell<T> {
    /// Copy of the current value.
    #[inline]
    pub fn get(&self) -> T {
        T::clone(&self.inner.load())
    }
}

impl<T: fmt::Debug> fmt::Debug for ValueCell<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueCell").field(&*self.inner.load()).finish()
    }
}

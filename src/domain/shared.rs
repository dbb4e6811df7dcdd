// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared, lockable section values.
//!
//! A section's live value is owned jointly by the registry, by the module that
//! registered it and by every observer. [`SharedConfig`] is that joint handle:
//! cloning it is cheap and every clone reads and writes the same instance.

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

/// A shared handle to a live configuration value.
///
/// The registry mutates the value in place under the write lock whenever a
/// reload changes it, so holders always read through [`read`](Self::read)
/// instead of caching a copy.
///
/// # Examples
///
/// ```rust
/// use modcfg::domain::SharedConfig;
///
/// let handle = SharedConfig::new(String::from("default"));
/// let other = handle.clone();
///
/// handle.write().push_str("-changed");
/// assert_eq!(*other.read(), "default-changed");
/// assert!(handle.ptr_eq(&other));
/// ```
pub struct SharedConfig<T> {
    inner: Arc<RwLock<T>>,
}

impl<T> SharedConfig<T> {
    /// Wraps `value` in a new shared handle.
    pub fn new(value: T) -> Self {
        Self {
            inner: Arc::new(RwLock::new(value)),
        }
    }

    /// Acquires shared read access to the value.
    ///
    /// Blocks while a load or a change notification holds the write lock.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Acquires exclusive write access to the value.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns `true` if both handles point to the same live value.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl<T: Clone> SharedConfig<T> {
    /// Returns a copy of the current value.
    pub fn snapshot(&self) -> T {
        self.read().clone()
    }
}

impl<T> Clone for SharedConfig<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default> Default for SharedConfig<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> From<T> for SharedConfig<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedConfig<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedConfig").field(&*self.read()).finish()
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capabilities of registered configuration values and their observers.
//!
//! Every serde-capable, thread-safe type is a [`Registrant`] and can be
//! registered as a section. Two optional capabilities refine that:
//!
//! - [`Updatable`]: the value wants to hear about its own changes. It is
//!   registered with `register_updatable` and its [`changed`](Updatable::changed)
//!   hook runs once per detected change, under the value's write lock.
//! - [`Reconfigurable`]: an independent instance (a connection pool, a worker)
//!   that wants to be handed the section value every time it changes.

use serde::de::DeserializeOwned;
use serde::Serialize;

/// A configuration type that can be registered as a section.
///
/// This trait is implemented automatically for every type that is
/// `Serialize + DeserializeOwned + Send + Sync + 'static`.
pub trait Registrant: Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Registrant for T where T: Serialize + DeserializeOwned + Send + Sync + 'static {}

/// A configuration value notified of its own changes.
///
/// # Examples
///
/// ```rust
/// use modcfg::domain::Updatable;
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct PoolConfig {
///     size: usize,
///     #[serde(skip)]
///     generation: u64,
/// }
///
/// impl Updatable for PoolConfig {
///     fn changed(&mut self) {
///         self.generation += 1;
///     }
///
///     fn absorb(&mut self, loaded: Self) {
///         self.size = loaded.size;
///     }
/// }
/// ```
pub trait Updatable: Registrant {
    /// Called once for every reload that changed the value.
    fn changed(&mut self);

    /// Adopts a freshly loaded value.
    ///
    /// The default replaces `self` entirely. Types with runtime-only fields
    /// (`#[serde(skip)]`) override it to carry those fields over.
    fn absorb(&mut self, loaded: Self)
    where
        Self: Sized,
    {
        *self = loaded;
    }
}

/// An instance reconfigured whenever a section changes.
///
/// Closures taking `&T` implement this trait, so a plain
/// `Arc::new(|cfg: &MyConfig| ...)` can be attached with `reconfigure`.
///
/// Observers run inside the reload that detected the change and must not call
/// back into the registry that notifies them.
pub trait Reconfigurable<T>: Send + Sync {
    /// Applies the section's current value.
    fn reconfigure(&self, config: &T);
}

impl<T, F> Reconfigurable<T> for F
where
    F: Fn(&T) + Send + Sync,
{
    fn reconfigure(&self, config: &T) {
        self(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Counted {
        key: String,
        #[serde(skip)]
        changes: usize,
    }

    impl Updatable for Counted {
        fn changed(&mut self) {
            self.changes += 1;
        }

        fn absorb(&mut self, loaded: Self) {
            self.key = loaded.key;
        }
    }

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Plain {
        key: String,
    }

    impl Updatable for Plain {
        fn changed(&mut self) {}
    }

    #[test]
    fn test_registrant_blanket_impl() {
        fn assert_registrant<T: Registrant>() {}
        assert_registrant::<Counted>();
        assert_registrant::<String>();
        assert_registrant::<std::collections::BTreeMap<String, u32>>();
    }

    #[test]
    fn test_absorb_keeps_runtime_fields() {
        let mut value = Counted {
            key: "old".to_string(),
            changes: 3,
        };
        value.absorb(Counted {
            key: "new".to_string(),
            changes: 0,
        });
        assert_eq!(value.key, "new");
        assert_eq!(value.changes, 3);
    }

    #[test]
    fn test_default_absorb_replaces() {
        let mut value = Plain {
            key: "old".to_string(),
        };
        value.absorb(Plain {
            key: "new".to_string(),
        });
        assert_eq!(value.key, "new");
    }

    #[test]
    fn test_closure_is_reconfigurable() {
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let observer = move |cfg: &Plain| {
            assert_eq!(cfg.key, "value");
            calls_clone.fetch_add(1, Ordering::SeqCst);
        };

        let plain = Plain {
            key: "value".to_string(),
        };
        observer.reconfigure(&plain);
        observer.reconfigure(&plain);

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_reconfigurable_is_object_safe() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<dyn Reconfigurable<Plain>>();
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reload trigger trait definition.
//!
//! This module defines the `ReloadTrigger` trait, which provides an interface for
//! waiting on external events (a signal, a file change, a message on a channel)
//! in the background and asking for a reload each time one occurs.

use crate::domain::Result;
use std::sync::Arc;

/// Type alias for reload callbacks.
///
/// This callback is invoked once per external event. It receives a short
/// description of the event (a signal number, a file path, ...) for logging.
pub type ReloadCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// A trait for external reload triggers.
///
/// A trigger runs independently of the code that started it. Every event it
/// observes produces exactly one callback invocation; events are neither
/// coalesced nor deduplicated.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow for use in multi-threaded contexts.
///
/// # Examples
///
/// ```rust
/// use modcfg::ports::{ReloadCallback, ReloadTrigger};
/// use modcfg::domain::Result;
///
/// struct Manual {
///     callback: Option<ReloadCallback>,
/// }
///
/// impl ReloadTrigger for Manual {
///     fn start(&mut self, callback: ReloadCallback) -> Result<()> {
///         self.callback = Some(callback);
///         Ok(())
///     }
///
///     fn stop(&mut self) -> Result<()> {
///         self.callback = None;
///         Ok(())
///     }
/// }
/// ```
pub trait ReloadTrigger: Send + Sync {
    /// Starts waiting for events in the background.
    ///
    /// `callback` is invoked once per event. Starting an already running
    /// trigger is an error.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The trigger is running
    /// * `Err(ConfigError)` - An error occurred while starting the trigger
    fn start(&mut self, callback: ReloadCallback) -> Result<()>;

    /// Stops waiting for events.
    ///
    /// After this method returns, the callback is no longer invoked.
    fn stop(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // Test implementation of ReloadTrigger for testing purposes
    struct TestTrigger {
        callback: Option<ReloadCallback>,
    }

    impl TestTrigger {
        fn new() -> Self {
            TestTrigger { callback: None }
        }

        fn fire(&self, event: &str) {
            if let Some(callback) = &self.callback {
                callback(event);
            }
        }
    }

    impl ReloadTrigger for TestTrigger {
        fn start(&mut self, callback: ReloadCallback) -> Result<()> {
            self.callback = Some(callback);
            Ok(())
        }

        fn stop(&mut self) -> Result<()> {
            self.callback = None;
            Ok(())
        }
    }

    #[test]
    fn test_trigger_fires_once_per_event() {
        let mut trigger = TestTrigger::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        trigger
            .start(Arc::new(move |_event: &str| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        trigger.fire("first");
        trigger.fire("second");
        trigger.fire("second");

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_trigger_stop() {
        let mut trigger = TestTrigger::new();
        let count = Arc::new(AtomicUsize::new(0));
        let count_clone = Arc::clone(&count);

        trigger
            .start(Arc::new(move |_event: &str| {
                count_clone.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();
        trigger.stop().unwrap();
        trigger.fire("ignored");

        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_trigger_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + ?Sized>() {}
        assert_send_sync::<Box<dyn ReloadTrigger>>();
    }
}

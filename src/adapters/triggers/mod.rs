// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reload trigger implementations.
//!
//! This module contains implementations of the `ReloadTrigger` trait that ask
//! for a reload when a message arrives, a file changes or a signal is received.

pub mod channel;
#[cfg(feature = "reload")]
pub mod file_watcher;
#[cfg(all(feature = "signals", unix))]
pub mod signal;

pub use channel::ChannelTrigger;
#[cfg(feature = "reload")]
pub use file_watcher::FileWatcher;
#[cfg(all(feature = "signals", unix))]
pub use signal::{SignalKind, SignalTrigger};

// SPDX-License-Identifier: MIT OR Apache-2.0

//! Service layer containing the section registry.
//!
//! This module contains the [`Registry`], which keeps every registered
//! configuration section, drives loads through a [`Loader`](crate::ports::Loader)
//! and notifies observers, plus the process-wide instance and its forwarders.

pub mod global;
pub mod registry;
mod section;

// Re-export commonly used types
pub use global::global;
pub use registry::Registry;

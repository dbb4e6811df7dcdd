// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ports layer containing trait definitions.
//!
//! This module contains the trait definitions (ports) through which the registry
//! talks to the outside world: loaders that populate sections, parsers that
//! understand a file format, and triggers that ask for reloads. These traits are
//! implemented by adapters in the adapters layer.

pub mod loader;
pub mod parser;
pub mod trigger;

// Re-export commonly used types
pub use loader::{Destination, Loader, Names, Targets};
pub use parser::{ConfigParser, Sections};
pub use trigger::{ReloadCallback, ReloadTrigger};

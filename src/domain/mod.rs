// SPDX-License-Identifier: MIT OR Apache-2.0

//! Domain layer containing core business logic and types.
//!
//! This module contains the core domain types and logic for the configuration crate:
//! the shared handles sections live in, the capabilities a registered value may
//! expose, the default merger, type-directed reading of section documents and
//! the change-detection signature. It is independent
//! of any file format or trigger mechanism.

pub mod errors;
pub mod lenient;
pub mod merge;
pub mod registrant;
pub mod shared;
pub mod signature;

// Re-export commonly used types
pub use errors::{ConfigError, Result};
pub use registrant::{Reconfigurable, Registrant, Updatable};
pub use shared::SharedConfig;
pub use signature::Signature;

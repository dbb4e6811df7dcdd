// SPDX-License-Identifier: MIT OR Apache-2.0

//! Self-registering, live-reloaded module configuration.
//!
//! Each module of a program declares its own configuration type and registers
//! a default value for it under a section name. A single configuration file,
//! loaded once and reloaded at will, is then split by section name and
//! written into the registered values in place. Modules that care about
//! changes are told after every reload that actually changed their section.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain Layer**: Shared handles, registration capabilities, the default
//!   merger and change signatures
//! - **Ports**: Trait definitions for loaders, file parsers and reload triggers
//! - **Adapters**: A file loader with YAML and INI parsers, and triggers driven by
//!   channels, file changes and Unix signals
//! - **Service**: The section registry and its process-wide instance
//!
//! # Features
//!
//! - **Self-registration**: modules register their own defaults; several
//!   registrations of one section merge, the first non-zero value of a field wins
//! - **Live values**: a reload updates the values behind existing handles
//! - **Change notification**: observers run only when their section changed
//! - **All or nothing**: a failed load leaves every section as it was
//!
//! # Feature Flags
//!
//! - `yaml`: Enable YAML file support (default)
//! - `ini`: Enable INI file support (default)
//! - `reload`: Enable reloading when the configuration file changes
//! - `signals`: Enable reloading on Unix signals
//! - `full`: Enable all features
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use modcfg::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, Clone, Default, Serialize, Deserialize)]
//! struct Database {
//!     host: String,
//!     port: u16,
//! }
//!
//! # fn main() -> Result<()> {
//! let database = modcfg::register_defaults(
//!     "database",
//!     Database { host: "localhost".to_string(), port: 5432 },
//! )?;
//!
//! modcfg::load(YamlLoader::new("/etc/myapp/config.yaml"))?;
//! println!("connecting to {}:{}", database.read().host, database.read().port);
//! # Ok(())
//! # }
//! ```

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![warn(clippy::all)]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

#[cfg(all(feature = "signals", unix))]
pub use service::global::reload_on_signals;
pub use service::global::{
    get, global, load, reconfigure, register, register_defaults, register_updatable,
    register_updatable_defaults, reload, reload_on, require,
};

/// Commonly used types and traits.
///
/// This module re-exports the most commonly used types and traits for convenient access.
pub mod prelude {
    pub use crate::domain::{
        ConfigError, Reconfigurable, Registrant, Result, SharedConfig, Updatable,
    };
    pub use crate::ports::{ConfigParser, Loader, ReloadTrigger, Sections, Targets};
    pub use crate::service::Registry;

    // Re-export adapters based on feature flags
    pub use crate::adapters::{ChannelTrigger, FileLoader};
    #[cfg(feature = "reload")]
    pub use crate::adapters::FileWatcher;
    #[cfg(feature = "ini")]
    pub use crate::adapters::{IniLoader, IniParser};
    #[cfg(all(feature = "signals", unix))]
    pub use crate::adapters::{SignalKind, SignalTrigger};
    #[cfg(feature = "yaml")]
    pub use crate::adapters::{YamlLoader, YamlParser};
}

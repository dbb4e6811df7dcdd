// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the configuration crate.
//!
//! This module defines the error types that can occur while registering
//! configuration sections, loading them from a file, or wiring reload triggers.
//! All errors use `thiserror` for proper error handling and conversion.

use thiserror::Error;

/// The main error type for configuration operations.
///
/// It is marked as `#[non_exhaustive]` to allow for future additions without
/// breaking backwards compatibility.
///
/// # Examples
///
/// ```
/// use modcfg::domain::errors::ConfigError;
///
/// fn lookup() -> Result<(), ConfigError> {
///     Err(ConfigError::SectionNotFound {
///         section: "database".to_string(),
///     })
/// }
///
/// assert!(lookup().is_err());
/// ```
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    /// `load` was called on a registry that has no loader.
    #[error("No loader was defined")]
    NoLoader,

    /// The requested section has never been registered.
    #[error("Configuration section not found: {section}")]
    SectionNotFound {
        /// The section that was not found
        section: String,
    },

    /// A section was registered, observed or read as a different type than the
    /// one it was created with.
    #[error("Configuration section '{section}' holds {found}, not {expected}")]
    SectionTypeMismatch {
        /// The section name
        section: String,
        /// The type the caller asked for
        expected: &'static str,
        /// The type the section was created with
        found: &'static str,
    },

    /// A registered value could not be serialized into a defaults document.
    #[error("Failed to serialize configuration section '{section}': {source}")]
    SerializationError {
        /// The section name
        section: String,
        /// The underlying serialization error
        #[source]
        source: serde_json::Error,
    },

    /// An error occurred in a configuration loader.
    #[error("Configuration source '{source_name}' error: {message}")]
    SourceError {
        /// The name of the loader that encountered the error
        source_name: String,
        /// The error message
        message: String,
        /// The underlying error, if any
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Failed to parse a configuration file or to fit its data to a section.
    #[error("Failed to parse configuration: {message}")]
    ParseError {
        /// The error message
        message: String,
        /// The underlying parsing error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A reload trigger could not be started or stopped.
    #[error("Reload trigger error: {message}")]
    TriggerError {
        /// The error message
        message: String,
        /// The underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A handle was registered under a second section name. One value can only
    /// back one section.
    #[error("Configuration handle for section '{section}' is already registered as '{owner}'")]
    HandleAlreadyRegistered {
        /// The section the handle was offered to
        section: String,
        /// The section already holding the handle
        owner: String,
    },
}

impl ConfigError {
    /// Creates a `ParseError` for data that does not fit a section's type.
    pub fn section_data(section: &str, err: serde_json::Error) -> Self {
        ConfigError::ParseError {
            message: format!("section '{}' does not match its registered type: {}", section, err),
            source: Some(Box::new(err)),
        }
    }
}

/// A specialized Result type for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

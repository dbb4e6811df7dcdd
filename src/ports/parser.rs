// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration parser trait definition.
//!
//! This module defines the `ConfigParser` trait, which provides an interface for
//! parsing configuration files in different formats (YAML, INI, ...) into
//! per-section documents.

use crate::domain::Result;
use serde_json::{Map, Value};

/// Parsed configuration data: section name to that section's document.
pub type Sections = Map<String, Value>;

/// A trait for parsing configuration files.
///
/// A parser turns the raw content of a file into a [`Sections`] map. The top
/// level of the file names the sections; everything below a section name is
/// that section's data, kept as a nested document.
///
/// # Section Layout
///
/// A YAML file like:
///
/// ```yaml
/// database:
///   host: localhost
///   port: 5432
/// ```
///
/// Should be parsed into one section, `database`, holding
/// `{"host": "localhost", "port": 5432}`.
///
/// # Examples
///
/// ```rust
/// use modcfg::domain::Result;
/// use modcfg::ports::{ConfigParser, Sections};
///
/// struct MyParser;
///
/// impl ConfigParser for MyParser {
///     fn parse(&self, content: &str) -> Result<Sections> {
///         // Implementation here
///         Ok(Sections::new())
///     }
///
///     fn supported_extensions(&self) -> &[&str] {
///         &["myformat"]
///     }
/// }
/// ```
pub trait ConfigParser: Send + Sync {
    /// Parses configuration content into per-section documents.
    ///
    /// # Arguments
    ///
    /// * `content` - The raw content of the configuration file
    ///
    /// # Returns
    ///
    /// * `Ok(Sections)` - The parsed configuration, keyed by section name
    /// * `Err(ConfigError)` - An error occurred during parsing
    fn parse(&self, content: &str) -> Result<Sections>;

    /// Returns the file extensions supported by this parser.
    ///
    /// This allows a loader to be selected from the file extension.
    ///
    /// # Returns
    ///
    /// A slice of file extensions (without the leading dot) that this parser supports.
    fn supported_extensions(&self) -> &[&str];

    /// Returns `true` if `extension` is one of [`supported_extensions`](Self::supported_extensions).
    ///
    /// The comparison ignores ASCII case.
    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|supported| supported.eq_ignore_ascii_case(extension))
    }
}

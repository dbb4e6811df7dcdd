// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader trait definition.
//!
//! This module defines the `Loader` trait, the only interface the registry needs
//! from the outside world. A loader is handed one [`Destination`] per registered
//! section and fills each of them from whatever part of its underlying file
//! belongs to that section.

use crate::domain::Result;
use crate::ports::parser::Sections;
use serde_json::Value;
use std::collections::{btree_map, BTreeMap};
use std::iter::Map;

/// A section waiting to be populated by a loader.
///
/// The registry stages whatever a destination receives and only commits it to
/// the live value once the whole load succeeded.
pub trait Destination {
    /// Receives the file data belonging to this section.
    ///
    /// `data` is the section's generic document. Members it does not mention
    /// fall back to the section's remembered defaults.
    fn populate(&mut self, data: &Value) -> Result<()>;
}

/// Iterator over the section names of a [`Targets`].
pub type Names<'t, 'a> =
    Map<btree_map::Keys<'t, String, &'a mut dyn Destination>, fn(&String) -> &str>;

/// The set of sections a loader must populate, keyed by section name.
///
/// # Examples
///
/// ```rust
/// use modcfg::domain::Result;
/// use modcfg::ports::{Destination, Targets};
/// use serde_json::{json, Value};
///
/// struct Capture(Option<Value>);
///
/// impl Destination for Capture {
///     fn populate(&mut self, data: &Value) -> Result<()> {
///         self.0 = Some(data.clone());
///         Ok(())
///     }
/// }
///
/// # fn main() -> Result<()> {
/// let mut capture = Capture(None);
/// let mut targets = Targets::new();
/// targets.insert("server", &mut capture);
///
/// let sections = json!({"server": {"port": 80}, "other": {}});
/// targets.populate_from(sections.as_object().unwrap())?;
/// drop(targets);
///
/// assert_eq!(capture.0, Some(json!({"port": 80})));
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct Targets<'a> {
    entries: BTreeMap<String, &'a mut dyn Destination>,
}

impl<'a> Targets<'a> {
    /// Creates an empty set of targets.
    pub fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }

    /// Adds the destination for section `name`.
    pub fn insert(&mut self, name: impl Into<String>, destination: &'a mut dyn Destination) {
        self.entries.insert(name.into(), destination);
    }

    /// Returns the destination for section `name`, if it is a target.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn Destination + 'a)> {
        self.entries.get_mut(name).map(|destination| &mut **destination)
    }

    /// Returns the section names, in order.
    pub fn names(&self) -> Names<'_, 'a> {
        self.entries
            .keys()
            .map(String::as_str as fn(&String) -> &str)
    }

    /// Iterates over every section name and its destination.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut (dyn Destination + 'a))> {
        self.entries
            .iter_mut()
            .map(|(name, destination)| (name.as_str(), &mut **destination))
    }

    /// Returns the number of targets.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if there is nothing to populate.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Populates every target from already parsed per-section data.
    ///
    /// Sections missing from `sections`, or explicitly `null` there, are left
    /// untouched. The first destination error aborts and is returned as is.
    pub fn populate_from(&mut self, sections: &Sections) -> Result<()> {
        for (name, destination) in self.iter_mut() {
            match sections.get(name) {
                Some(data) if !data.is_null() => destination.populate(data)?,
                _ => tracing::trace!("Section '{}' not present in configuration, left untouched", name),
            }
        }
        Ok(())
    }
}

/// A trait for configuration loaders.
///
/// A loader owns the knowledge of where the configuration lives and how it is
/// encoded. On success, every target whose section exists in the underlying
/// data must have been populated; targets for absent sections are left alone.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` because reloads may be issued from
/// trigger threads.
///
/// # Examples
///
/// ```rust
/// use modcfg::domain::Result;
/// use modcfg::ports::{Loader, Targets};
/// use serde_json::json;
///
/// struct Fixed;
///
/// impl Loader for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     fn load(&self, targets: &mut Targets<'_>) -> Result<()> {
///         let data = json!({"server": {"port": 8080}});
///         if let Some(sections) = data.as_object() {
///             targets.populate_from(sections)?;
///         }
///         Ok(())
///     }
/// }
///
/// assert_eq!(Fixed.name(), "fixed");
/// ```
pub trait Loader: Send + Sync {
    /// Returns the name of this loader, used in logs and error messages.
    fn name(&self) -> &str;

    /// Populates `targets` from the underlying configuration.
    fn load(&self, targets: &mut Targets<'_>) -> Result<()>;
}

impl<L: Loader + ?Sized> Loader for Box<L> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn load(&self, targets: &mut Targets<'_>) -> Result<()> {
        (**self).load(targets)
    }
}

// SPDX-License-Identifier: MIT OR Apache-2.0

//! The section registry.
//!
//! A [`Registry`] maps section names to the live configuration values of the
//! modules that registered them. Each load asks the registry's [`Loader`] to
//! populate every registered section at once, then tells the observers of each
//! section whose value actually changed.

use crate::domain::{
    ConfigError, Reconfigurable, Registrant, Result, SharedConfig, Updatable,
};
use crate::ports::{Loader, ReloadTrigger, Targets};
use crate::service::section::{to_document, AnySection, Observer, Pending, Section};
use std::any::type_name;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};

type SectionMap = BTreeMap<String, Box<dyn AnySection>>;

/// A registry of named configuration sections.
///
/// Modules register their configuration under a section name together with
/// the defaults they want. The registry remembers those defaults, and every
/// [`load`](Registry::load) overlays the file data on them and writes the
/// result into the module's [`SharedConfig`] in place, so handles obtained
/// before a reload observe the new values.
///
/// Sections are processed in name order. Concurrent loads serialize on the
/// section map.
///
/// # Locking
///
/// A load holds the write lock of every registered value while the loader
/// runs. A thread holding a guard from [`SharedConfig::read`] or
/// [`SharedConfig::write`] must release it before loading.
///
/// Observers are told after the section map is released, each holding the
/// write lock of the value it observes. They may look up, register and
/// observe sections, but must not lock their own handle or load the
/// registry that notifies them.
///
/// # Examples
///
/// ```rust
/// use modcfg::prelude::*;
/// use serde::{Deserialize, Serialize};
/// use serde_json::json;
///
/// #[derive(Debug, Default, Serialize, Deserialize)]
/// struct Server {
///     host: String,
///     port: u16,
/// }
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
/// # fn main() -> Result<()> {
/// let registry = Registry::new(Fixed);
/// let server = registry.register_defaults(
///     "server",
///     Server { host: "localhost".to_string(), port: 80 },
/// )?;
///
/// registry.load()?;
/// assert_eq!(server.read().host, "localhost");
/// assert_eq!(server.read().port, 8080);
/// # Ok(())
/// # }
/// ```
pub struct Registry {
    sections: Mutex<SectionMap>,
    loader: RwLock<Option<Arc<dyn Loader>>>,
    loaded: AtomicBool,
}

impl Registry {
    /// Creates a registry that loads through `loader`.
    pub fn new<L: Loader + 'static>(loader: L) -> Self {
        Self {
            sections: Mutex::new(BTreeMap::new()),
            loader: RwLock::new(Some(Arc::new(loader))),
            loaded: AtomicBool::new(false),
        }
    }

    /// Creates a registry without a loader.
    ///
    /// Sections can be registered right away; loading fails with
    /// [`ConfigError::NoLoader`] until [`set_loader`](Registry::set_loader) is
    /// called.
    pub fn empty() -> Self {
        Self {
            sections: Mutex::new(BTreeMap::new()),
            loader: RwLock::new(None),
            loaded: AtomicBool::new(false),
        }
    }

    /// Replaces the loader used by subsequent loads.
    pub fn set_loader<L: Loader + 'static>(&self, loader: L) {
        let loader: Arc<dyn Loader> = Arc::new(loader);
        tracing::debug!("Using configuration loader '{}'", loader.name());
        *self.loader.write().unwrap_or_else(PoisonError::into_inner) = Some(loader);
    }

    /// Returns the name of the current loader, if any.
    pub fn loader_name(&self) -> Option<String> {
        self.current_loader().map(|loader| loader.name().to_string())
    }

    /// Returns `true` once at least one load has succeeded.
    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Returns the names of all known sections, in order.
    pub fn section_names(&self) -> Vec<String> {
        self.lock_sections().keys().cloned().collect()
    }

    /// Registers `config` under section `name`.
    ///
    /// The current value of `config` is merged into the section's remembered
    /// defaults: members already set by an earlier registration win, zero
    /// members are filled in. The first handle registered for a name becomes
    /// the section's live value; later registrations only contribute
    /// defaults. Registering does not load.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::SerializationError`] if the value cannot be serialized
    /// * [`ConfigError::SectionTypeMismatch`] if `name` holds another type
    /// * [`ConfigError::HandleAlreadyRegistered`] if `config` already backs
    ///   another section
    pub fn register<T: Registrant>(&self, name: &str, config: &SharedConfig<T>) -> Result<()> {
        self.register_section(name, config, |_| {}).map(|_| ())
    }

    /// Registers `config` like [`register`](Registry::register) and calls
    /// [`Updatable::changed`] on the live value every time it changes.
    pub fn register_updatable<T: Updatable>(
        &self,
        name: &str,
        config: &SharedConfig<T>,
    ) -> Result<()> {
        self.register_section(name, config, Section::install_changed_hook)
            .map(|_| ())
    }

    /// Registers `defaults` under section `name` and returns the section's
    /// live handle.
    ///
    /// The returned handle is a new one holding `defaults` if this is the
    /// first registration for `name`, otherwise the handle registered first.
    pub fn register_defaults<T: Registrant>(
        &self,
        name: &str,
        defaults: T,
    ) -> Result<SharedConfig<T>> {
        self.register_section(name, &SharedConfig::new(defaults), |_| {})
    }

    /// Like [`register_defaults`](Registry::register_defaults), with the
    /// change hook of [`register_updatable`](Registry::register_updatable).
    pub fn register_updatable_defaults<T: Updatable>(
        &self,
        name: &str,
        defaults: T,
    ) -> Result<SharedConfig<T>> {
        self.register_section(
            name,
            &SharedConfig::new(defaults),
            Section::install_changed_hook,
        )
    }

    fn register_section<T: Registrant>(
        &self,
        name: &str,
        config: &SharedConfig<T>,
        install: impl FnOnce(&mut Section<T>),
    ) -> Result<SharedConfig<T>> {
        let document = to_document(name, config)?;

        let mut sections = self.lock_sections();
        if let Some(owner) = handle_owner(&sections, config, name) {
            return Err(ConfigError::HandleAlreadyRegistered {
                section: name.to_string(),
                owner,
            });
        }
        let section = typed_section::<T>(&mut sections, name)?;
        section.add_defaults(&document);
        if section.adopt(config) {
            tracing::debug!("Registered configuration section '{}'", name);
        } else {
            tracing::debug!("Merged additional defaults into section '{}'", name);
        }
        install(&mut *section);

        // adopt() above guarantees a live value
        Ok(section.current().unwrap_or_else(|| config.clone()))
    }

    /// Attaches `observer` to section `name`.
    ///
    /// The observer is told about every later change of the section's value,
    /// after all observers attached before it. If the registry has already
    /// loaded and the section has a value, the observer is also called once
    /// with that value before this method returns.
    ///
    /// The section does not have to be registered yet.
    ///
    /// # Errors
    ///
    /// [`ConfigError::SectionTypeMismatch`] if `name` holds another type.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use modcfg::prelude::*;
    /// use std::sync::Arc;
    ///
    /// # fn main() -> Result<()> {
    /// let registry = Registry::empty();
    /// registry.reconfigure::<String, _>("greeting", Arc::new(|greeting: &String| {
    ///     println!("greeting is now {}", greeting);
    /// }))?;
    /// # Ok(())
    /// # }
    /// ```
    pub fn reconfigure<T, R>(&self, name: &str, observer: Arc<R>) -> Result<()>
    where
        T: Registrant,
        R: Reconfigurable<T> + 'static,
    {
        let observer: Arc<dyn Reconfigurable<T>> = observer;
        let current = {
            let mut sections = self.lock_sections();
            let section = typed_section::<T>(&mut sections, name)?;
            section.attach(Observer::Instance(Arc::clone(&observer)));
            tracing::debug!(
                "Attached observer {} to section '{}'",
                section.observer_count(),
                name
            );
            section.current()
        };

        if self.is_loaded() {
            if let Some(current) = current {
                let config = current.read();
                observer.reconfigure(&config);
            }
        }
        Ok(())
    }

    /// Returns the live handle of section `name`.
    ///
    /// `None` if the section is unknown, has no value yet, or holds another
    /// type.
    pub fn get<T: Registrant>(&self, name: &str) -> Option<SharedConfig<T>> {
        let sections = self.lock_sections();
        sections
            .get(name)?
            .as_any()
            .downcast_ref::<Section<T>>()?
            .current()
    }

    /// Returns the live handle of section `name`, or the reason there is none.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::SectionNotFound`] if nothing was registered for `name`
    /// * [`ConfigError::SectionTypeMismatch`] if `name` holds another type
    pub fn require<T: Registrant>(&self, name: &str) -> Result<SharedConfig<T>> {
        let sections = self.lock_sections();
        let not_found = || ConfigError::SectionNotFound {
            section: name.to_string(),
        };

        let entry = sections.get(name).ok_or_else(not_found)?;
        let section = entry.as_any().downcast_ref::<Section<T>>().ok_or_else(|| {
            ConfigError::SectionTypeMismatch {
                section: name.to_string(),
                expected: type_name::<T>(),
                found: entry.type_name(),
            }
        })?;
        section.current().ok_or_else(not_found)
    }

    /// Loads every registered section through the loader.
    ///
    /// The loader populates all sections while their values are locked. If
    /// it fails, no value changes, no observer runs, and its error is
    /// returned unchanged. Otherwise every populated section receives its
    /// file data overlaid on its remembered defaults, sections absent from
    /// the file keep their value, and the observers of every section whose
    /// value changed are told, in section order, once the section map is
    /// unlocked.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::NoLoader`] if no loader was set
    /// * whatever the loader returns
    pub fn load(&self) -> Result<()> {
        let loader = self.current_loader().ok_or(ConfigError::NoLoader)?;
        let mut sections = self.lock_sections();

        let populated = {
            let mut pending: Vec<Box<dyn Pending + '_>> = sections
                .values()
                .filter_map(|section| section.begin_load())
                .collect();

            let mut targets = Targets::new();
            for section in pending.iter_mut() {
                let name = section.name().to_string();
                targets.insert(name, section.as_destination());
            }

            if let Err(e) = loader.load(&mut targets) {
                tracing::debug!("Loader '{}' failed, nothing changed: {}", loader.name(), e);
                return Err(e);
            }
            drop(targets);

            let mut committed = 0;
            for section in pending.iter_mut() {
                if section.commit() {
                    committed += 1;
                }
            }
            committed
        };

        let notifications: Vec<_> = sections
            .values_mut()
            .filter_map(|section| section.notify())
            .collect();
        self.loaded.store(true, Ordering::SeqCst);

        tracing::debug!(
            "Loaded {} of {} sections through '{}', {} changed",
            populated,
            sections.len(),
            loader.name(),
            notifications.len()
        );
        drop(sections);

        for notify in notifications {
            notify();
        }
        Ok(())
    }

    /// Loads again. Identical to [`load`](Registry::load).
    pub fn reload(&self) -> Result<()> {
        self.load()
    }

    /// Starts `trigger` so that each of its events reloads this registry.
    ///
    /// The trigger only keeps a weak reference: once the registry is dropped,
    /// events are ignored. Failed reloads are logged and do not stop the
    /// trigger.
    pub fn reload_on(self: &Arc<Self>, trigger: &mut dyn ReloadTrigger) -> Result<()> {
        let registry = Arc::downgrade(self);
        trigger.start(Arc::new(move |event: &str| {
            let Some(registry) = registry.upgrade() else {
                tracing::debug!("Ignoring {}, the registry is gone", event);
                return;
            };
            tracing::info!("Reloading configuration after {}", event);
            if let Err(e) = registry.reload() {
                tracing::warn!("Failed to reload configuration after {}: {}", event, e);
            }
        }))
    }

    /// Reloads this registry each time the process receives one of `signals`.
    ///
    /// Returns the running trigger. Dropping it stops listening.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use modcfg::adapters::SignalKind;
    /// use modcfg::service::Registry;
    /// use std::sync::Arc;
    ///
    /// # fn main() -> modcfg::domain::Result<()> {
    /// let registry = Arc::new(Registry::empty());
    /// let _trigger = registry.reload_on_signals([SignalKind::hangup()])?;
    /// # Ok(())
    /// # }
    /// ```
    #[cfg(all(feature = "signals", unix))]
    pub fn reload_on_signals<I>(self: &Arc<Self>, signals: I) -> Result<crate::adapters::SignalTrigger>
    where
        I: IntoIterator<Item = crate::adapters::SignalKind>,
    {
        let mut trigger = crate::adapters::SignalTrigger::new(signals);
        self.reload_on(&mut trigger)?;
        Ok(trigger)
    }

    fn current_loader(&self) -> Option<Arc<dyn Loader>> {
        self.loader
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn lock_sections(&self) -> MutexGuard<'_, SectionMap> {
        self.sections.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::empty()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("sections", &self.section_names())
            .field("loader", &self.loader_name())
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

/// Returns the name of another section already holding `config`.
fn handle_owner<T: Registrant>(
    sections: &SectionMap,
    config: &SharedConfig<T>,
    name: &str,
) -> Option<String> {
    sections
        .iter()
        .filter(|(other, _)| other.as_str() != name)
        .find(|(_, section)| {
            section
                .as_any()
                .downcast_ref::<Section<T>>()
                .and_then(Section::current)
                .map_or(false, |current| current.ptr_eq(config))
        })
        .map(|(other, _)| other.clone())
}

/// Returns the section `name` as a `Section<T>`, creating it if needed.
fn typed_section<'m, T: Registrant>(
    sections: &'m mut SectionMap,
    name: &str,
) -> Result<&'m mut Section<T>> {
    let entry = sections
        .entry(name.to_string())
        .or_insert_with(|| Box::new(Section::<T>::new(name)));
    let found = entry.type_name();
    entry
        .as_any_mut()
        .downcast_mut::<Section<T>>()
        .ok_or_else(|| ConfigError::SectionTypeMismatch {
            section: name.to_string(),
            expected: type_name::<T>(),
            found,
        })
}

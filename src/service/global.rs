// SPDX-License-Identifier: MIT OR Apache-2.0

//! The process-wide registry.
//!
//! Most programs keep a single registry that every module registers into at
//! start-up. The functions here forward to that shared instance, which is
//! created empty on first use.

use crate::domain::{Reconfigurable, Registrant, Result, SharedConfig, Updatable};
use crate::ports::{Loader, ReloadTrigger};
use crate::service::Registry;
use once_cell::sync::Lazy;
use std::sync::Arc;

static GLOBAL: Lazy<Arc<Registry>> = Lazy::new(|| Arc::new(Registry::empty()));

/// Returns the process-wide registry.
pub fn global() -> Arc<Registry> {
    Arc::clone(&GLOBAL)
}

/// Installs `loader` on the process-wide registry and loads it.
///
/// # Examples
///
/// ```rust,no_run
/// use modcfg::adapters::YamlLoader;
///
/// # fn main() -> modcfg::domain::Result<()> {
/// modcfg::load(YamlLoader::new("/etc/myapp/config.yaml"))?;
/// # Ok(())
/// # }
/// ```
pub fn load<L: Loader + 'static>(loader: L) -> Result<()> {
    GLOBAL.set_loader(loader);
    GLOBAL.load()
}

/// Reloads the process-wide registry. See [`Registry::reload`].
pub fn reload() -> Result<()> {
    GLOBAL.reload()
}

/// See [`Registry::register`].
pub fn register<T: Registrant>(name: &str, config: &SharedConfig<T>) -> Result<()> {
    GLOBAL.register(name, config)
}

/// See [`Registry::register_updatable`].
pub fn register_updatable<T: Updatable>(name: &str, config: &SharedConfig<T>) -> Result<()> {
    GLOBAL.register_updatable(name, config)
}

/// See [`Registry::register_defaults`].
pub fn register_defaults<T: Registrant>(name: &str, defaults: T) -> Result<SharedConfig<T>> {
    GLOBAL.register_defaults(name, defaults)
}

/// See [`Registry::register_updatable_defaults`].
pub fn register_updatable_defaults<T: Updatable>(
    name: &str,
    defaults: T,
) -> Result<SharedConfig<T>> {
    GLOBAL.register_updatable_defaults(name, defaults)
}

/// See [`Registry::reconfigure`].
pub fn reconfigure<T, R>(name: &str, observer: Arc<R>) -> Result<()>
where
    T: Registrant,
    R: Reconfigurable<T> + 'static,
{
    GLOBAL.reconfigure(name, observer)
}

/// See [`Registry::get`].
pub fn get<T: Registrant>(name: &str) -> Option<SharedConfig<T>> {
    GLOBAL.get(name)
}

/// See [`Registry::require`].
pub fn require<T: Registrant>(name: &str) -> Result<SharedConfig<T>> {
    GLOBAL.require(name)
}

/// See [`Registry::reload_on`].
pub fn reload_on(trigger: &mut dyn ReloadTrigger) -> Result<()> {
    GLOBAL.reload_on(trigger)
}

/// See [`Registry::reload_on_signals`].
#[cfg(all(feature = "signals", unix))]
pub fn reload_on_signals<I>(signals: I) -> Result<crate::adapters::SignalTrigger>
where
    I: IntoIterator<Item = crate::adapters::SignalKind>,
{
    GLOBAL.reload_on_signals(signals)
}

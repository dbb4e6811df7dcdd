// SPDX-License-Identifier: MIT OR Apache-2.0

//! Unix signal reload trigger.
//!
//! This module provides a trigger that fires each time the process receives
//! one of a set of signals, the conventional way to ask a daemon to re-read
//! its configuration (`kill -HUP <pid>`).

use crate::domain::{ConfigError, Result};
use crate::ports::{ReloadCallback, ReloadTrigger};
use std::thread::{self, JoinHandle};
use tokio::signal::unix::{signal, Signal};
use tokio::sync::{mpsc, watch};

pub use tokio::signal::unix::SignalKind;

/// A reload trigger driven by Unix signals.
///
/// Signal handlers are installed when the trigger starts, so signals arriving
/// afterwards no longer get their default disposition. Every received signal
/// is one event; the event is described as `signal <number>`.
///
/// # Examples
///
/// ```rust,no_run
/// use modcfg::adapters::{SignalKind, SignalTrigger};
/// use modcfg::ports::ReloadTrigger;
/// use std::sync::Arc;
///
/// # fn main() -> modcfg::domain::Result<()> {
/// let mut trigger = SignalTrigger::new([SignalKind::hangup(), SignalKind::user_defined1()]);
/// trigger.start(Arc::new(|event: &str| println!("reload after {}", event)))?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct SignalTrigger {
    /// Signals to listen for
    signals: Vec<SignalKind>,
    /// Thread running the signal loop
    worker: Option<JoinHandle<()>>,
    /// Stop signal sender
    stop_tx: Option<watch::Sender<bool>>,
}

impl SignalTrigger {
    /// Creates a trigger for `signals`.
    pub fn new(signals: impl IntoIterator<Item = SignalKind>) -> Self {
        Self {
            signals: signals.into_iter().collect(),
            worker: None,
            stop_tx: None,
        }
    }

    /// Returns the signals this trigger listens for.
    pub fn signals(&self) -> &[SignalKind] {
        &self.signals
    }

    fn error(message: String, source: std::io::Error) -> ConfigError {
        ConfigError::TriggerError {
            message,
            source: Some(Box::new(source)),
        }
    }
}

impl ReloadTrigger for SignalTrigger {
    fn start(&mut self, callback: ReloadCallback) -> Result<()> {
        if self.worker.is_some() {
            return Err(ConfigError::TriggerError {
                message: "Signal trigger is already running".to_string(),
                source: None,
            });
        }
        if self.signals.is_empty() {
            return Err(ConfigError::TriggerError {
                message: "No signals to listen for".to_string(),
                source: None,
            });
        }

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Self::error(format!("Failed to build signal runtime: {}", e), e))?;

        // Handlers are installed here so that no signal is missed once
        // start() returns.
        let mut streams: Vec<(i32, Signal)> = Vec::with_capacity(self.signals.len());
        {
            let _context = runtime.enter();
            for kind in &self.signals {
                let raw = kind.as_raw_value();
                let stream = signal(*kind).map_err(|e| {
                    Self::error(format!("Failed to listen for signal {}: {}", raw, e), e)
                })?;
                streams.push((raw, stream));
            }
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let worker = thread::Builder::new()
            .name("modcfg-signal-trigger".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<i32>();
                    for (raw, mut stream) in streams {
                        let event_tx = event_tx.clone();
                        tokio::spawn(async move {
                            while stream.recv().await.is_some() {
                                if event_tx.send(raw).is_err() {
                                    break;
                                }
                            }
                        });
                    }
                    drop(event_tx);

                    loop {
                        tokio::select! {
                            Some(raw) = event_rx.recv() => {
                                callback(&format!("signal {}", raw));
                            }
                            _ = stop_rx.changed() => break,
                            else => break,
                        }
                    }
                });
            })
            .map_err(|e| Self::error(format!("Failed to spawn signal trigger thread: {}", e), e))?;

        tracing::info!("Listening for reload signals {:?}", self.signals);
        self.worker = Some(worker);
        self.stop_tx = Some(stop_tx);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(true);
        }

        if let Some(handle) = self.worker.take() {
            handle.join().map_err(|_| ConfigError::TriggerError {
                message: "Failed to join signal trigger thread".to_string(),
                source: None,
            })?;
            tracing::info!("Stopped listening for reload signals");
        }
        Ok(())
    }
}

impl Drop for SignalTrigger {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

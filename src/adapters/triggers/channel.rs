// SPDX-License-Identifier: MIT OR Apache-2.0

//! Channel-driven reload trigger.
//!
//! This module provides a trigger that fires once for every message received
//! on a `std::sync::mpsc` channel. It lets any part of a program, or a test,
//! ask for a reload without sharing the registry.

use crate::domain::{ConfigError, Result};
use crate::ports::{ReloadCallback, ReloadTrigger};
use std::fmt::Debug;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::{Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How often the worker thread checks for a stop request
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// A reload trigger fed by a channel.
///
/// Every message is one event. The trigger ends by itself once all senders
/// are dropped.
///
/// # Examples
///
/// ```rust
/// use modcfg::adapters::ChannelTrigger;
/// use modcfg::ports::ReloadTrigger;
/// use std::sync::Arc;
///
/// # fn main() -> modcfg::domain::Result<()> {
/// let (sender, mut trigger) = ChannelTrigger::channel();
/// trigger.start(Arc::new(|event: &str| println!("reload requested: {}", event)))?;
///
/// sender.send("admin request").unwrap();
/// trigger.stop()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ChannelTrigger<E> {
    /// Receiving end, handed to the worker thread on start
    receiver: Option<Mutex<Receiver<E>>>,
    /// Thread handle for the worker thread
    worker: Option<JoinHandle<()>>,
    /// Stop signal sender
    stop_tx: Option<Sender<()>>,
}

impl<E: Debug + Send + 'static> ChannelTrigger<E> {
    /// Creates a trigger reading from `receiver`.
    pub fn new(receiver: Receiver<E>) -> Self {
        Self {
            receiver: Some(Mutex::new(receiver)),
            worker: None,
            stop_tx: None,
        }
    }

    /// Creates a channel and a trigger reading from it.
    pub fn channel() -> (Sender<E>, Self) {
        let (sender, receiver) = channel();
        (sender, Self::new(receiver))
    }
}

impl<E: Debug + Send + 'static> ReloadTrigger for ChannelTrigger<E> {
    fn start(&mut self, callback: ReloadCallback) -> Result<()> {
        let receiver = self
            .receiver
            .take()
            .ok_or_else(|| ConfigError::TriggerError {
                message: "Channel trigger was already started".to_string(),
                source: None,
            })?
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let (stop_tx, stop_rx) = channel::<()>();

        let worker = thread::Builder::new()
            .name("modcfg-channel-trigger".to_string())
            .spawn(move || loop {
                if stop_rx.try_recv().is_ok() {
                    break;
                }
                match receiver.recv_timeout(POLL_INTERVAL) {
                    Ok(event) => callback(&format!("channel event {:?}", event)),
                    Err(RecvTimeoutError::Timeout) => continue,
                    Err(RecvTimeoutError::Disconnected) => {
                        tracing::debug!("Reload channel closed, trigger finished");
                        break;
                    }
                }
            })
            .map_err(|e| ConfigError::TriggerError {
                message: format!("Failed to spawn channel trigger thread: {}", e),
                source: Some(Box::new(e)),
            })?;

        tracing::info!("Channel reload trigger started");
        self.worker = Some(worker);
        self.stop_tx = Some(stop_tx);
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }

        if let Some(handle) = self.worker.take() {
            handle.join().map_err(|_| ConfigError::TriggerError {
                message: "Failed to join channel trigger thread".to_string(),
                source: None,
            })?;
            tracing::info!("Channel reload trigger stopped");
        }
        Ok(())
    }
}

impl<E> Drop for ChannelTrigger<E> {
    fn drop(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

//! In-process delivery of external events to running workflow instances.

use crate::domain::model::InstanceId;
use crate::domain::ports::EventWaiter;
use crate::utils::error::{ReminderError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

const SIGNAL_BUFFER: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signal {
    pub name: String,
    pub payload: String,
}

impl Signal {
    pub fn new(name: impl Into<String>, payload: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            payload: payload.into(),
        }
    }
}

/// Receives signals for one instance over a channel.
///
/// Signals whose name does not match the awaited one are dropped. Once every
/// sender is gone the waiter parks forever, like an event that never comes.
#[derive(Debug)]
pub struct ChannelEventWaiter {
    receiver: mpsc::Receiver<Signal>,
}

impl ChannelEventWaiter {
    pub fn new(receiver: mpsc::Receiver<Signal>) -> Self {
        Self { receiver }
    }

    /// A waiter plus the sender that feeds it.
    pub fn channel() -> (mpsc::Sender<Signal>, Self) {
        let (tx, rx) = mpsc::channel(SIGNAL_BUFFER);
        (tx, Self::new(rx))
    }
}

#[async_trait]
impl EventWaiter for ChannelEventWaiter {
    async fn wait_for_event(&mut self, name: &str) -> Result<String> {
        loop {
            match self.receiver.recv().await {
                Some(signal) if signal.name == name => return Ok(signal.payload),
                Some(signal) => {
                    tracing::debug!("Ignoring event '{}' while waiting for '{}'", signal.name, name);
                }
                None => std::future::pending::<()>().await,
            }
        }
    }
}

/// Routes raised events to the instance they are addressed to.
#[derive(Debug, Clone, Default)]
pub struct EventHub {
    senders: Arc<Mutex<HashMap<InstanceId, mpsc::Sender<Signal>>>>,
}

impl EventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an instance and hands back its waiter. Re-registering
    /// replaces the previous waiter.
    pub fn register(&self, instance_id: &InstanceId) -> ChannelEventWaiter {
        let (tx, waiter) = ChannelEventWaiter::channel();
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.insert(instance_id.clone(), tx);
        waiter
    }

    pub fn unregister(&self, instance_id: &InstanceId) {
        let mut senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.remove(instance_id);
    }

    pub fn is_registered(&self, instance_id: &InstanceId) -> bool {
        let senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
        senders.contains_key(instance_id)
    }

    pub async fn raise_event(
        &self,
        instance_id: &InstanceId,
        name: &str,
        payload: impl Into<String>,
    ) -> Result<()> {
        let sender = {
            let senders = self.senders.lock().unwrap_or_else(|e| e.into_inner());
            senders.get(instance_id).cloned()
        };

        let sender = sender.ok_or_else(|| ReminderError::SignalError {
            message: format!("No running instance '{}'", instance_id),
        })?;

        sender
            .send(Signal::new(name, payload))
            .await
            .map_err(|_| ReminderError::SignalError {
                message: format!("Instance '{}' is no longer listening", instance_id),
            })?;

        tracing::debug!("Raised event '{}' for instance {}", name, instance_id);
        Ok(())
    }
}

use crate::domain::model::ReminderMessage;
use crate::domain::ports::Notifier;
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};

/// Notifier that only logs and records messages. Used for dry runs.
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    sent: Arc<Mutex<Vec<ReminderMessage>>>,
}

impl LogNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<ReminderMessage> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, message: &ReminderMessage) -> Result<()> {
        tracing::info!("📱 [dry-run] SMS to {}: {}", message.recipient, message.body);
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(message.clone());
        Ok(())
    }
}

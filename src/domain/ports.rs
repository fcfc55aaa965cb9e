use crate::core::timer::TimerHandle;
use crate::domain::model::{ReminderMessage, RetryPolicy};
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Delivers a text message to a phone number.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &ReminderMessage) -> Result<()>;
}

/// Wall clock plus cancellable wake-ups at absolute times.
pub trait Scheduler: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    fn create_timer(&self, fire_at: DateTime<Utc>) -> TimerHandle;
}

/// Suspends until a named external event reaches this workflow instance.
///
/// Implementations never return if no matching event ever arrives.
/// `wait_for_event` must be cancel-safe: it is raced against a timer and
/// dropped when the timer wins.
#[async_trait]
pub trait EventWaiter: Send {
    async fn wait_for_event(&mut self, name: &str) -> Result<String>;
}

pub trait ReminderSettings: Send + Sync {
    fn interval(&self) -> Duration;
    fn payment_link_base(&self) -> Option<&str>;

    fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::default()
    }
}

#[async_trait]
impl<N: Notifier + ?Sized> Notifier for std::sync::Arc<N> {
    async fn send(&self, message: &ReminderMessage) -> Result<()> {
        (**self).send(message).await
    }
}

impl<S: Scheduler + ?Sized> Scheduler for std::sync::Arc<S> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }

    fn create_timer(&self, fire_at: DateTime<Utc>) -> TimerHandle {
        (**self).create_timer(fire_at)
    }
}

#[async_trait]
impl<W: EventWaiter + ?Sized> EventWaiter for Box<W> {
    async fn wait_for_event(&mut self, name: &str) -> Result<String> {
        (**self).wait_for_event(name).await
    }
}

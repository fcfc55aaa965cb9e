//! Cancellable timers for the reminder race.
//!
//! Every timer created through a [`TimerLedger`] is tracked until it either
//! fires or is cancelled, so callers can check that a finished workflow left
//! nothing pending behind it.

use crate::domain::ports::Scheduler;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// Far enough out to never matter, near enough not to overflow `Instant`.
const MAX_TIMER_DELAY: Duration = Duration::from_secs(60 * 60 * 24 * 365 * 30);

type WakeFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Pending,
    Fired,
    Cancelled,
}

/// Shared record of timer states, keyed by timer id.
#[derive(Debug, Clone, Default)]
pub struct TimerLedger {
    next_id: Arc<AtomicU64>,
    states: Arc<Mutex<HashMap<u64, TimerState>>>,
}

impl TimerLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn register(&self) -> u64 {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        self.set(id, TimerState::Pending);
        id
    }

    fn set(&self, id: u64, state: TimerState) {
        let mut states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.insert(id, state);
    }

    pub fn state(&self, id: u64) -> Option<TimerState> {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.get(&id).copied()
    }

    pub fn count(&self, state: TimerState) -> usize {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.values().filter(|s| **s == state).count()
    }

    pub fn pending(&self) -> usize {
        self.count(TimerState::Pending)
    }

    pub fn total(&self) -> usize {
        let states = self.states.lock().unwrap_or_else(|e| e.into_inner());
        states.len()
    }
}

/// A single scheduled wake-up owned by the attempt that created it.
///
/// Dropping a pending handle cancels it.
pub struct TimerHandle {
    id: u64,
    fire_at: DateTime<Utc>,
    wake: Option<WakeFuture>,
    ledger: TimerLedger,
}

impl TimerHandle {
    pub fn new(
        fire_at: DateTime<Utc>,
        wake: impl Future<Output = ()> + Send + 'static,
        ledger: TimerLedger,
    ) -> Self {
        let id = ledger.register();
        Self {
            id,
            fire_at,
            wake: Some(Box::pin(wake)),
            ledger,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn fire_at(&self) -> DateTime<Utc> {
        self.fire_at
    }

    pub fn state(&self) -> TimerState {
        self.ledger.state(self.id).unwrap_or(TimerState::Cancelled)
    }

    pub fn is_pending(&self) -> bool {
        self.state() == TimerState::Pending
    }

    /// Resolves once the timer fires. A cancelled timer never resolves.
    ///
    /// Cancel-safe: dropping the returned future keeps the timer armed.
    pub async fn fired(&mut self) {
        if let Some(wake) = self.wake.as_mut() {
            wake.as_mut().await;
            self.wake = None;
            self.ledger.set(self.id, TimerState::Fired);
            return;
        }
        if self.state() != TimerState::Fired {
            std::future::pending::<()>().await;
        }
    }

    /// Cancels a pending timer. No-op once fired or cancelled.
    pub fn cancel(&mut self) {
        if self.wake.take().is_some() {
            tracing::debug!("Cancelled timer {} due at {}", self.id, self.fire_at);
            self.ledger.set(self.id, TimerState::Cancelled);
        }
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if self.wake.is_some() {
            tracing::warn!("Timer {} dropped while pending, cancelling", self.id);
            self.cancel();
        }
    }
}

impl std::fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TimerHandle")
            .field("id", &self.id)
            .field("fire_at", &self.fire_at)
            .field("state", &self.state())
            .finish()
    }
}

/// Scheduler backed by the tokio timer wheel.
///
/// `now()` is derived from tokio's clock so it follows paused or advanced
/// time in tests.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    origin_utc: DateTime<Utc>,
    origin: tokio::time::Instant,
    ledger: TimerLedger,
}

impl TokioScheduler {
    pub fn new() -> Self {
        Self {
            origin_utc: Utc::now(),
            origin: tokio::time::Instant::now(),
            ledger: TimerLedger::new(),
        }
    }

    pub fn ledger(&self) -> &TimerLedger {
        &self.ledger
    }
}

impl Default for TokioScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for TokioScheduler {
    fn now(&self) -> DateTime<Utc> {
        let elapsed = chrono::Duration::from_std(self.origin.elapsed())
            .unwrap_or_else(|_| chrono::Duration::zero());
        self.origin_utc + elapsed
    }

    fn create_timer(&self, fire_at: DateTime<Utc>) -> TimerHandle {
        let delay = (fire_at - self.now())
            .to_std()
            .unwrap_or(Duration::ZERO)
            .min(MAX_TIMER_DELAY);
        let deadline = tokio::time::Instant::now() + delay;
        TimerHandle::new(fire_at, tokio::time::sleep_until(deadline), self.ledger.clone())
    }
}

//! Reminder escalation state machine
//!
//! Pure transitions: given the current state and an event, produce the next
//! state plus the effects the driver must perform, in order. Nothing here
//! touches the network or the clock directly, so a fixed event sequence
//! always replays to the same result.

use crate::core::templates::MessageTemplate;
use crate::domain::model::{PaymentOutcome, ReminderMessage, ReminderSession, SessionStatus};
use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EscalationState {
    /// Reminder `n` is due (before `Start`) or outstanding.
    AwaitingAttempt(u32),
    Paid,
    Exhausted,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EscalationEvent {
    /// Kick off the first attempt
    Start,
    /// The current attempt's timer expired
    TimerFired,
    /// The payment signal won the race
    PaymentReceived { payload: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    StartTimer { attempt: u32, fire_at: DateTime<Utc> },
    CancelTimer { attempt: u32 },
    Send(ReminderMessage),
    Finish(PaymentOutcome),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Escalation {
    pub session: ReminderSession,
    pub state: EscalationState,
    pub payment_link: Option<String>,
}

impl Escalation {
    pub fn new(session: ReminderSession, payment_link: Option<String>) -> Self {
        Self {
            session,
            state: EscalationState::AwaitingAttempt(1),
            payment_link,
        }
    }

    /// Pure transition function - returns new state and effects
    pub fn transition(
        &self,
        event: EscalationEvent,
        now: DateTime<Utc>,
        template: &dyn MessageTemplate,
    ) -> (Escalation, Vec<Effect>) {
        match (self.state, event) {
            // AwaitingAttempt(1), not started → reminder #1 goes out
            (EscalationState::AwaitingAttempt(1), EscalationEvent::Start)
                if self.session.attempts_made == 0 =>
            {
                self.enter_attempt(1, now, template)
            }

            // Timer won: escalate or give up
            (EscalationState::AwaitingAttempt(n), EscalationEvent::TimerFired)
                if self.session.attempts_made == n =>
            {
                if n < self.session.max_attempts {
                    self.enter_attempt(n + 1, now, template)
                } else {
                    let mut next = self.clone();
                    next.state = EscalationState::Exhausted;
                    next.session.resolve(SessionStatus::Exhausted);
                    (next, vec![Effect::Finish(PaymentOutcome::Pending)])
                }
            }

            // Payment won: stop the clock. Thanks only go out before the
            // final reminder; a payment after it completes silently.
            (EscalationState::AwaitingAttempt(n), EscalationEvent::PaymentReceived { .. })
                if self.session.attempts_made == n =>
            {
                let mut next = self.clone();
                next.state = EscalationState::Paid;
                next.session.resolve(SessionStatus::Paid);

                let mut effects = vec![Effect::CancelTimer { attempt: n }];
                if n < self.session.max_attempts {
                    effects.push(Effect::Send(ReminderMessage::new(
                        self.session.phone_number.clone(),
                        template.render_thank_you(),
                    )));
                }
                effects.push(Effect::Finish(PaymentOutcome::Completed));
                (next, effects)
            }

            // Invalid transitions - no change
            _ => (self.clone(), vec![]),
        }
    }

    fn enter_attempt(
        &self,
        attempt: u32,
        now: DateTime<Utc>,
        template: &dyn MessageTemplate,
    ) -> (Escalation, Vec<Effect>) {
        let mut next = self.clone();
        next.state = EscalationState::AwaitingAttempt(attempt);
        next.session.record_attempt();

        let body = template.render_reminder(
            attempt,
            self.session.amount_owed.as_ref(),
            self.payment_link.as_deref(),
        );
        let effects = vec![
            Effect::StartTimer {
                attempt,
                fire_at: deadline(now, self.session.interval),
            },
            Effect::Send(ReminderMessage::new(self.session.phone_number.clone(), body)),
        ];
        (next, effects)
    }

    /// Folds a fixed event sequence, collecting every effect produced.
    pub fn replay(
        &self,
        events: impl IntoIterator<Item = EscalationEvent>,
        now: DateTime<Utc>,
        template: &dyn MessageTemplate,
    ) -> (Escalation, Vec<Effect>) {
        events
            .into_iter()
            .fold((self.clone(), Vec::new()), |(machine, mut effects), event| {
                let (next, produced) = machine.transition(event, now, template);
                effects.extend(produced);
                (next, effects)
            })
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            EscalationState::Paid | EscalationState::Exhausted
        )
    }

    pub fn outcome(&self) -> Option<PaymentOutcome> {
        match self.state {
            EscalationState::Paid => Some(PaymentOutcome::Completed),
            EscalationState::Exhausted => Some(PaymentOutcome::Pending),
            EscalationState::AwaitingAttempt(_) => None,
        }
    }
}

fn deadline(now: DateTime<Utc>, interval: Duration) -> DateTime<Utc> {
    chrono::Duration::from_std(interval)
        .ok()
        .and_then(|delta| now.checked_add_signed(delta))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

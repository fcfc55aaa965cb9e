use crate::core::escalation::{Effect, Escalation, EscalationEvent};
use crate::core::templates::{payment_link, FormTemplate, MessageTemplate, PlainTemplate};
use crate::core::timer::TimerHandle;
use crate::domain::model::{
    InstanceId, PaymentOutcome, ReminderInput, ReminderMessage, ReminderSession, WorkflowReport,
    PAYMENT_EVENT,
};
use crate::domain::ports::{EventWaiter, Notifier, ReminderSettings, Scheduler};
use crate::utils::error::{ReminderError, Result};
use crate::utils::validation::{parse_interval_seconds, validate_phone_number};
use rust_decimal::Decimal;
use std::str::FromStr;

/// Which side of the race resolved first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaceOutcome {
    Timeout,
    Signal(String),
}

/// A validated run, ready to drive.
struct PreparedRun {
    escalation: Escalation,
    template: Box<dyn MessageTemplate>,
}

/// Drives one [`Escalation`] against real collaborators.
pub struct ReminderWorkflow<N: Notifier, S: Scheduler, C: ReminderSettings> {
    notifier: N,
    scheduler: S,
    settings: C,
}

impl<N: Notifier, S: Scheduler, C: ReminderSettings> ReminderWorkflow<N, S, C> {
    pub fn new(notifier: N, scheduler: S, settings: C) -> Self {
        Self {
            notifier,
            scheduler,
            settings,
        }
    }

    /// Runs the workflow to completion and returns its terminal result.
    pub async fn run<W: EventWaiter>(
        &self,
        instance_id: &InstanceId,
        input: ReminderInput,
        waiter: &mut W,
    ) -> Result<PaymentOutcome> {
        self.execute(instance_id, input, waiter)
            .await
            .map(|report| report.result)
    }

    /// Like [`run`](Self::run) but reports attempts and messages sent too.
    pub async fn execute<W: EventWaiter>(
        &self,
        instance_id: &InstanceId,
        input: ReminderInput,
        waiter: &mut W,
    ) -> Result<WorkflowReport> {
        let prepared = self.prepare(instance_id, input)?;

        tracing::info!(
            "Starting reminder run {} for {} (interval {:?})",
            instance_id,
            prepared.escalation.session.phone_number,
            prepared.escalation.session.interval
        );

        let mut timer: Option<TimerHandle> = None;
        let mut messages_sent = 0;
        let result = self
            .drive(prepared, &mut timer, &mut messages_sent, waiter)
            .await;

        // The current attempt's timer must not outlive the run, whatever happened.
        if let Some(pending) = timer.as_mut() {
            pending.cancel();
        }

        let (escalation, outcome) = result?;
        tracing::info!(
            "Reminder run {} finished: {} after {} attempt(s)",
            instance_id,
            outcome,
            escalation.session.attempts_made
        );

        Ok(WorkflowReport {
            instance_id: instance_id.clone(),
            result: outcome,
            attempts: escalation.session.attempts_made,
            messages_sent,
        })
    }

    fn prepare(&self, instance_id: &InstanceId, input: ReminderInput) -> Result<PreparedRun> {
        let phone_number = validate_phone_number(input.phone_number())?.to_string();

        match input {
            ReminderInput::Simple(_) => {
                let session = ReminderSession::new(phone_number, None, self.settings.interval());
                Ok(PreparedRun {
                    escalation: Escalation::new(session, None),
                    template: Box::new(PlainTemplate),
                })
            }
            ReminderInput::Form(form) => {
                let interval = match form.notification_interval.as_deref() {
                    Some(raw) => parse_interval_seconds("notification_interval", raw)?,
                    None => self.settings.interval(),
                };
                let amount_owed = form
                    .amount_owed
                    .as_deref()
                    .filter(|raw| !raw.trim().is_empty())
                    .map(parse_amount)
                    .transpose()?;
                let link = self
                    .settings
                    .payment_link_base()
                    .map(|base| payment_link(base, &instance_id.0));

                let session = ReminderSession::new(phone_number, amount_owed, interval);
                Ok(PreparedRun {
                    escalation: Escalation::new(session, link),
                    template: Box::new(FormTemplate),
                })
            }
        }
    }

    async fn drive<W: EventWaiter>(
        &self,
        prepared: PreparedRun,
        timer: &mut Option<TimerHandle>,
        messages_sent: &mut usize,
        waiter: &mut W,
    ) -> Result<(Escalation, PaymentOutcome)> {
        let PreparedRun {
            mut escalation,
            template,
        } = prepared;
        let mut event = EscalationEvent::Start;

        loop {
            let (next, effects) =
                escalation.transition(event, self.scheduler.now(), &*template);
            escalation = next;

            let mut finished = None;
            for effect in effects {
                match effect {
                    Effect::StartTimer { attempt, fire_at } => {
                        let armed = self.scheduler.create_timer(fire_at);
                        tracing::debug!(
                            "Attempt {} expires at {} (timer {})",
                            attempt,
                            armed.fire_at(),
                            armed.id()
                        );
                        *timer = Some(armed);
                    }
                    Effect::CancelTimer { attempt } => {
                        tracing::debug!("Payment arrived during attempt {}", attempt);
                        if let Some(pending) = timer.as_mut() {
                            pending.cancel();
                        }
                    }
                    Effect::Send(message) => {
                        self.send_with_retry(&message).await?;
                        *messages_sent += 1;
                    }
                    Effect::Finish(outcome) => finished = Some(outcome),
                }
            }

            if let Some(outcome) = finished {
                return Ok((escalation, outcome));
            }

            let current = timer.as_mut().ok_or_else(|| ReminderError::SignalError {
                message: "No timer armed for the current attempt".to_string(),
            })?;

            event = match race(waiter, current).await? {
                RaceOutcome::Signal(payload) => {
                    tracing::info!("💳 Payment confirmation received");
                    EscalationEvent::PaymentReceived { payload }
                }
                RaceOutcome::Timeout => {
                    tracing::info!(
                        "⏰ No payment before attempt {} expired",
                        escalation.session.attempts_made
                    );
                    EscalationEvent::TimerFired
                }
            };
        }
    }

    async fn send_with_retry(&self, message: &ReminderMessage) -> Result<()> {
        let policy = self.settings.retry_policy();
        let mut tries = 0;

        loop {
            tries += 1;
            match self.notifier.send(message).await {
                Ok(()) => {
                    tracing::debug!("Sent message to {}", message.recipient);
                    return Ok(());
                }
                Err(e) if e.is_retryable() && tries < policy.max_attempts => {
                    tracing::warn!(
                        "Send to {} failed (try {}/{}): {}",
                        message.recipient,
                        tries,
                        policy.max_attempts,
                        e
                    );
                    tokio::time::sleep(policy.delay).await;
                }
                Err(e) => {
                    tracing::error!("Giving up sending to {}: {}", message.recipient, e);
                    return Err(e);
                }
            }
        }
    }
}

/// Waits for whichever comes first. Payment wins ties.
pub async fn race<W: EventWaiter>(waiter: &mut W, timer: &mut TimerHandle) -> Result<RaceOutcome> {
    tokio::select! {
        biased;
        signal = waiter.wait_for_event(PAYMENT_EVENT) => signal.map(RaceOutcome::Signal),
        _ = timer.fired() => Ok(RaceOutcome::Timeout),
    }
}

fn parse_amount(raw: &str) -> Result<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| {
        ReminderError::invalid_input("amount_owed", format!("'{}' is not a decimal amount: {}", raw, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::signal::{ChannelEventWaiter, Signal};
    use crate::core::timer::{TimerState, TokioScheduler};
    use crate::domain::model::{FormInput, RetryPolicy};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Clone, Default)]
    struct MockNotifier {
        sent: Arc<Mutex<Vec<ReminderMessage>>>,
        failures_left: Arc<Mutex<u32>>,
        failure_status: Option<u16>,
    }

    impl MockNotifier {
        fn failing(times: u32, status: u16) -> Self {
            Self {
                failures_left: Arc::new(Mutex::new(times)),
                failure_status: Some(status),
                ..Self::default()
            }
        }

        fn bodies(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|m| m.body.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, message: &ReminderMessage) -> Result<()> {
            {
                let mut left = self.failures_left.lock().unwrap();
                if *left > 0 {
                    *left -= 1;
                    return Err(ReminderError::NotificationError {
                        status: self.failure_status,
                        message: "provider unavailable".to_string(),
                    });
                }
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    struct MockSettings {
        interval: Duration,
        link_base: Option<String>,
        retry: RetryPolicy,
    }

    impl MockSettings {
        fn new(seconds: u64) -> Self {
            Self {
                interval: Duration::from_secs(seconds),
                link_base: None,
                retry: RetryPolicy::default(),
            }
        }
    }

    impl ReminderSettings for MockSettings {
        fn interval(&self) -> Duration {
            self.interval
        }

        fn payment_link_base(&self) -> Option<&str> {
            self.link_base.as_deref()
        }

        fn retry_policy(&self) -> RetryPolicy {
            self.retry
        }
    }

    fn make_workflow(
        notifier: MockNotifier,
        settings: MockSettings,
    ) -> (ReminderWorkflow<MockNotifier, TokioScheduler, MockSettings>, TokioScheduler) {
        let scheduler = TokioScheduler::new();
        (
            ReminderWorkflow::new(notifier, scheduler.clone(), settings),
            scheduler,
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_phone_number_sends_nothing() {
        let notifier = MockNotifier::default();
        let (workflow, scheduler) = make_workflow(notifier.clone(), MockSettings::new(30));
        let (_tx, mut waiter) = ChannelEventWaiter::channel();

        let result = workflow
            .run(&InstanceId::from("i-1"), ReminderInput::simple(""), &mut waiter)
            .await;

        assert!(matches!(result, Err(ReminderError::InvalidInput { .. })));
        assert!(notifier.bodies().is_empty());
        assert_eq!(scheduler.ledger().total(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_payment_already_queued_wins_first_race() {
        let notifier = MockNotifier::default();
        let (workflow, scheduler) = make_workflow(notifier.clone(), MockSettings::new(30));
        let (tx, mut waiter) = ChannelEventWaiter::channel();
        tx.send(Signal::new(PAYMENT_EVENT, "paid")).await.unwrap();

        let report = workflow
            .execute(&InstanceId::from("i-2"), ReminderInput::simple("+15550001111"), &mut waiter)
            .await
            .unwrap();

        assert_eq!(report.result, PaymentOutcome::Completed);
        assert_eq!(report.messages_sent, 2);
        assert_eq!(report.attempts, 1);
        assert_eq!(notifier.bodies()[1], "Thank you for your payment!");
        assert_eq!(scheduler.ledger().count(TimerState::Cancelled), 1);
        assert_eq!(scheduler.ledger().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_tie_goes_to_payment() {
        let scheduler = TokioScheduler::new();
        let mut timer = scheduler.create_timer(scheduler.now());
        let (tx, mut waiter) = ChannelEventWaiter::channel();
        tx.send(Signal::new(PAYMENT_EVENT, "paid")).await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let outcome = race(&mut waiter, &mut timer).await.unwrap();
        assert_eq!(outcome, RaceOutcome::Signal("paid".to_string()));
        assert!(timer.is_pending());
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_payment_exhausts() {
        let notifier = MockNotifier::default();
        let (workflow, scheduler) = make_workflow(notifier.clone(), MockSettings::new(30));
        let (_tx, mut waiter) = ChannelEventWaiter::channel();

        let outcome = workflow
            .run(&InstanceId::from("i-3"), ReminderInput::simple("+15550001111"), &mut waiter)
            .await
            .unwrap();

        assert_eq!(outcome, PaymentOutcome::Pending);
        assert_eq!(notifier.bodies().len(), 3);
        assert_eq!(scheduler.ledger().count(TimerState::Fired), 3);
        assert_eq!(scheduler.ledger().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_form_interval_overrides_settings() {
        let notifier = MockNotifier::default();
        let (workflow, scheduler) = make_workflow(notifier.clone(), MockSettings::new(3600));
        let (_tx, mut waiter) = ChannelEventWaiter::channel();
        let started = scheduler.now();

        let input = ReminderInput::Form(FormInput {
            phone_number: Some("+15550001111".to_string()),
            amount_owed: Some("10.00".to_string()),
            notification_interval: Some("5".to_string()),
        });
        workflow
            .run(&InstanceId::from("i-4"), input, &mut waiter)
            .await
            .unwrap();

        let elapsed = scheduler.now() - started;
        assert_eq!(elapsed.num_seconds(), 15);
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_form_interval_is_invalid_input() {
        let notifier = MockNotifier::default();
        let (workflow, _) = make_workflow(notifier.clone(), MockSettings::new(30));
        let (_tx, mut waiter) = ChannelEventWaiter::channel();

        let input = ReminderInput::Form(FormInput {
            phone_number: Some("+15550001111".to_string()),
            amount_owed: None,
            notification_interval: Some("often".to_string()),
        });
        let result = workflow.run(&InstanceId::from("i-5"), input, &mut waiter).await;

        assert!(matches!(result, Err(ReminderError::InvalidInput { field, .. }) if field == "notification_interval"));
        assert!(notifier.bodies().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_bad_amount_is_invalid_input() {
        let notifier = MockNotifier::default();
        let (workflow, _) = make_workflow(notifier.clone(), MockSettings::new(30));
        let (_tx, mut waiter) = ChannelEventWaiter::channel();

        let input = ReminderInput::Form(FormInput {
            phone_number: Some("+15550001111".to_string()),
            amount_owed: Some("a lot".to_string()),
            notification_interval: None,
        });
        let result = workflow.run(&InstanceId::from("i-6"), input, &mut waiter).await;

        assert!(matches!(result, Err(ReminderError::InvalidInput { field, .. }) if field == "amount_owed"));
        assert!(notifier.bodies().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_send_failure_propagates_and_cancels_timer() {
        let notifier = MockNotifier::failing(1, 500);
        let (workflow, scheduler) = make_workflow(notifier.clone(), MockSettings::new(30));
        let (_tx, mut waiter) = ChannelEventWaiter::channel();

        let result = workflow
            .run(&InstanceId::from("i-7"), ReminderInput::simple("+15550001111"), &mut waiter)
            .await;

        assert!(matches!(result, Err(ReminderError::NotificationError { .. })));
        assert_eq!(scheduler.ledger().count(TimerState::Cancelled), 1);
        assert_eq!(scheduler.ledger().pending(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_recovers_transient_failure() {
        let notifier = MockNotifier::failing(2, 503);
        let mut settings = MockSettings::new(30);
        settings.retry = RetryPolicy::new(3, Duration::from_millis(100));
        let (workflow, _) = make_workflow(notifier.clone(), settings);
        let (tx, mut waiter) = ChannelEventWaiter::channel();
        tx.send(Signal::new(PAYMENT_EVENT, "paid")).await.unwrap();

        let outcome = workflow
            .run(&InstanceId::from("i-8"), ReminderInput::simple("+15550001111"), &mut waiter)
            .await
            .unwrap();

        assert_eq!(outcome, PaymentOutcome::Completed);
        assert_eq!(notifier.bodies().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_policy_does_not_retry_rejections() {
        let notifier = MockNotifier::failing(1, 400);
        let mut settings = MockSettings::new(30);
        settings.retry = RetryPolicy::new(3, Duration::from_millis(100));
        let (workflow, _) = make_workflow(notifier.clone(), settings);
        let (_tx, mut waiter) = ChannelEventWaiter::channel();

        let result = workflow
            .run(&InstanceId::from("i-9"), ReminderInput::simple("+15550001111"), &mut waiter)
            .await;

        assert!(matches!(
            result,
            Err(ReminderError::NotificationError { status: Some(400), .. })
        ));
    }
}

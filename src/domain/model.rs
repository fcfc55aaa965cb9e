use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

/// Reminders sent before a session is given up on.
pub const MAX_ATTEMPTS: u32 = 3;

/// Name of the external event that confirms payment.
pub const PAYMENT_EVENT: &str = "PaymentResponse";

/// Identifies one running reminder workflow.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InstanceId(pub String);

impl InstanceId {
    pub fn generate() -> Self {
        InstanceId(Uuid::new_v4().to_string())
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InstanceId {
    fn from(s: String) -> Self {
        InstanceId(s)
    }
}

impl From<&str> for InstanceId {
    fn from(s: &str) -> Self {
        InstanceId(s.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderMessage {
    pub recipient: String,
    pub body: String,
}

impl ReminderMessage {
    pub fn new(recipient: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            recipient: recipient.into(),
            body: body.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionStatus {
    Pending,
    Paid,
    Exhausted,
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, SessionStatus::Pending)
    }
}

/// Terminal result of a reminder run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentOutcome {
    Completed,
    Pending,
}

impl PaymentOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentOutcome::Completed => "Payment completed",
            PaymentOutcome::Pending => "Payment pending",
        }
    }
}

impl fmt::Display for PaymentOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for PaymentOutcome {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Per-invocation state of one reminder run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderSession {
    pub phone_number: String,
    pub amount_owed: Option<Decimal>,
    pub interval: Duration,
    pub attempts_made: u32,
    pub max_attempts: u32,
    pub status: SessionStatus,
}

impl ReminderSession {
    pub fn new(phone_number: String, amount_owed: Option<Decimal>, interval: Duration) -> Self {
        Self {
            phone_number,
            amount_owed,
            interval,
            attempts_made: 0,
            max_attempts: MAX_ATTEMPTS,
            status: SessionStatus::Pending,
        }
    }

    /// Counts one more reminder, never beyond `max_attempts`.
    pub fn record_attempt(&mut self) {
        if self.status == SessionStatus::Pending && self.attempts_made < self.max_attempts {
            self.attempts_made += 1;
        }
    }

    /// Moves a pending session to a terminal status. Terminal statuses stick.
    pub fn resolve(&mut self, status: SessionStatus) {
        if self.status == SessionStatus::Pending {
            self.status = status;
        }
    }
}

/// Bounded retry of a single SMS send. One try means failures propagate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            delay: Duration::from_millis(500),
        }
    }
}

/// Form-based invocation payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormInput {
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub amount_owed: Option<String>,
    #[serde(default)]
    pub notification_interval: Option<String>,
}

/// Caller input: either a bare phone number or the form structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReminderInput {
    Simple(Option<String>),
    Form(FormInput),
}

impl ReminderInput {
    pub fn simple(phone_number: impl Into<String>) -> Self {
        ReminderInput::Simple(Some(phone_number.into()))
    }

    pub fn phone_number(&self) -> Option<&str> {
        match self {
            ReminderInput::Simple(phone) => phone.as_deref(),
            ReminderInput::Form(form) => form.phone_number.as_deref(),
        }
    }

    pub fn is_form(&self) -> bool {
        matches!(self, ReminderInput::Form(_))
    }
}

/// What a finished run reports back to its host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowReport {
    pub instance_id: InstanceId,
    pub result: PaymentOutcome,
    pub attempts: u32,
    pub messages_sent: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_strings() {
        assert_eq!(PaymentOutcome::Completed.to_string(), "Payment completed");
        assert_eq!(PaymentOutcome::Pending.to_string(), "Payment pending");
    }

    #[test]
    fn test_session_status_is_monotonic() {
        let mut session =
            ReminderSession::new("+15550001111".to_string(), None, Duration::from_secs(30));
        session.resolve(SessionStatus::Paid);
        session.resolve(SessionStatus::Exhausted);
        assert_eq!(session.status, SessionStatus::Paid);
        assert!(session.status.is_terminal());
    }

    #[test]
    fn test_attempts_capped_at_max() {
        let mut session =
            ReminderSession::new("+15550001111".to_string(), None, Duration::from_secs(30));
        for _ in 0..5 {
            session.record_attempt();
        }
        assert_eq!(session.attempts_made, MAX_ATTEMPTS);
    }

    #[test]
    fn test_deserialize_simple_input() {
        let input: ReminderInput = serde_json::from_str(r#""+15550001111""#).unwrap();
        assert_eq!(input, ReminderInput::simple("+15550001111"));
        assert!(!input.is_form());

        let null_input: ReminderInput = serde_json::from_str("null").unwrap();
        assert_eq!(null_input.phone_number(), None);
    }

    #[test]
    fn test_deserialize_form_input() {
        let input: ReminderInput = serde_json::from_str(
            r#"{"phoneNumber": "+15550001111", "amountOwed": "42.50", "notificationInterval": "60"}"#,
        )
        .unwrap();

        assert!(input.is_form());
        assert_eq!(input.phone_number(), Some("+15550001111"));
        match input {
            ReminderInput::Form(form) => {
                assert_eq!(form.amount_owed.as_deref(), Some("42.50"));
                assert_eq!(form.notification_interval.as_deref(), Some("60"));
            }
            other => panic!("expected form input, got {:?}", other),
        }
    }

    #[test]
    fn test_report_serializes_result_string() {
        let report = WorkflowReport {
            instance_id: InstanceId::from("abc"),
            result: PaymentOutcome::Pending,
            attempts: 3,
            messages_sent: 3,
        };
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["result"], "Payment pending");
        assert_eq!(json["instanceId"], "abc");
        assert_eq!(json["messagesSent"], 3);
    }
}

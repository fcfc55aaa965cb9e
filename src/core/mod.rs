pub mod escalation;
pub mod signal;
pub mod templates;
pub mod timer;
pub mod workflow;

pub use crate::domain::model::{
    InstanceId, PaymentOutcome, ReminderInput, ReminderMessage, ReminderSession, WorkflowReport,
};
pub use crate::domain::ports::{EventWaiter, Notifier, ReminderSettings, Scheduler};
pub use crate::utils::error::Result;

// Adapters layer: concrete implementations of the workflow ports for
// external systems (SMS provider, payment-status endpoint, stdin).

pub mod log_notifier;
pub mod payment_status;
pub mod stdin_events;
pub mod twilio;

pub use log_notifier::LogNotifier;
pub use payment_status::HttpPaymentWaiter;
pub use stdin_events::StdinEventWaiter;
pub use twilio::{TwilioConfig, TwilioNotifier};

use rust_decimal::Decimal;

pub const THANK_YOU: &str = "Thank you for your payment!";

/// Renders the SMS text for each reminder attempt.
pub trait MessageTemplate: Send + Sync {
    fn render_reminder(&self, attempt: u32, amount: Option<&Decimal>, link: Option<&str>)
        -> String;

    fn render_thank_you(&self) -> String {
        THANK_YOU.to_string()
    }
}

/// Wording for runs started from a bare phone number.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainTemplate;

impl MessageTemplate for PlainTemplate {
    fn render_reminder(
        &self,
        attempt: u32,
        _amount: Option<&Decimal>,
        _link: Option<&str>,
    ) -> String {
        FormTemplate.render_reminder(attempt, None, None)
    }
}

/// Wording for form-based runs: mentions the amount and the confirmation
/// link when they are known.
#[derive(Debug, Clone, Copy, Default)]
pub struct FormTemplate;

impl MessageTemplate for FormTemplate {
    fn render_reminder(&self, attempt: u32, amount: Option<&Decimal>, link: Option<&str>) -> String {
        match attempt {
            0 | 1 => format!(
                "Hello, you have a bill due{}. Please pay your bill to stop receiving these messages.{}",
                amount.map(|a| format!(" totaling {}", a)).unwrap_or_default(),
                link.map(|l| format!(" Click here when you're done paying - {}", l))
                    .unwrap_or_default(),
            ),
            2 => format!(
                "Hi again, you still haven't paid your bill{}. Please send in your payment to stop receiving messages{}",
                amount.map(|a| format!(" totaling {}", a)).unwrap_or_default(),
                link.map(|l| format!(" - {}", l)).unwrap_or_default(),
            ),
            _ => format!(
                "Hi one more time, this is your FINAL reminder{}. Please send in your payment to stop receiving messages{}",
                amount
                    .map(|a| format!(" for your bill totaling {}", a))
                    .unwrap_or_default(),
                link.map(|l| format!(" - {}", l)).unwrap_or_default(),
            ),
        }
    }
}

/// Joins the configured base URL and the instance id into a confirmation link.
pub fn payment_link(base: &str, instance_id: &str) -> String {
    format!("{}/{}", base.trim_end_matches('/'), instance_id)
}

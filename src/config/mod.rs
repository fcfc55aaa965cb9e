pub mod cli;
pub mod lambda;
pub mod toml_config;

use crate::utils::error::Result;
use crate::utils::validation::parse_interval_seconds;
use std::time::Duration;

#[cfg(feature = "cli")]
use crate::domain::model::{FormInput, ReminderInput};
#[cfg(feature = "cli")]
use crate::domain::ports::ReminderSettings;
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

/// Reads the reminder interval from `SMS_INTERVAL`, falling back to the
/// legacy `SmsInterval` name.
pub fn env_interval() -> Result<Option<Duration>> {
    for name in ["SMS_INTERVAL", "SmsInterval"] {
        if let Ok(raw) = std::env::var(name) {
            return parse_interval_seconds(name, &raw).map(Some);
        }
    }
    Ok(None)
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Default, Serialize, Deserialize, Parser)]
#[command(name = "bill-reminder")]
#[command(about = "Send SMS bill reminders until the bill is paid or three reminders went out")]
pub struct CliConfig {
    /// Phone number to remind
    #[arg(long)]
    pub phone_number: Option<String>,

    /// Amount owed, mentioned in the reminder text
    #[arg(long)]
    pub amount_owed: Option<String>,

    /// Seconds between reminders (overrides config file and SMS_INTERVAL)
    #[arg(long)]
    pub interval_seconds: Option<u64>,

    /// Base URL of the payment confirmation link
    #[arg(long)]
    pub payment_link_base: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    pub config: Option<String>,

    /// Instance id used in the payment link (random when omitted)
    #[arg(long)]
    pub instance_id: Option<String>,

    /// Log messages instead of sending them
    #[arg(long)]
    pub dry_run: bool,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Builds the workflow input from the resolved settings. An amount or a
    /// payment link from any source switches to the form wording.
    pub fn reminder_input<C: ReminderSettings>(&self, settings: &C) -> ReminderInput {
        if self.amount_owed.is_some() || settings.payment_link_base().is_some() {
            ReminderInput::Form(FormInput {
                phone_number: self.phone_number.clone(),
                amount_owed: self.amount_owed.clone(),
                notification_interval: None,
            })
        } else {
            ReminderInput::Simple(self.phone_number.clone())
        }
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::cli::CliSettings;
    use super::toml_config::TomlConfig;
    use super::*;

    fn make_cli(args: &[&str]) -> CliConfig {
        let mut argv = vec!["bill-reminder"];
        argv.extend_from_slice(args);
        CliConfig::parse_from(argv)
    }

    #[test]
    fn test_plain_input_without_amount_or_link() {
        let cli = make_cli(&["--phone-number", "+15550001111"]);
        let settings = CliSettings::resolve(Some(60), None, None).unwrap();

        assert_eq!(
            cli.reminder_input(&settings),
            ReminderInput::Simple(Some("+15550001111".to_string()))
        );
    }

    #[test]
    fn test_link_from_config_file_selects_form_input() {
        let file = TomlConfig::from_toml_str(
            "[reminder]\ninterval_seconds = 60\npayment_link_base = \"https://pay.example.com/c\"\n",
        )
        .unwrap();
        let cli = make_cli(&["--phone-number", "+1555", "--instance-id", "abc"]);
        let settings =
            CliSettings::resolve(cli.interval_seconds, cli.payment_link_base.clone(), Some(&file))
                .unwrap();

        assert_eq!(
            cli.reminder_input(&settings),
            ReminderInput::Form(FormInput {
                phone_number: Some("+1555".to_string()),
                amount_owed: None,
                notification_interval: None,
            })
        );
    }

    #[test]
    fn test_amount_flag_selects_form_input() {
        let cli = make_cli(&["--phone-number", "+15550001111", "--amount-owed", "19.99"]);
        let settings = CliSettings::resolve(Some(60), None, None).unwrap();

        match cli.reminder_input(&settings) {
            ReminderInput::Form(form) => assert_eq!(form.amount_owed.as_deref(), Some("19.99")),
            other => panic!("expected form input, got {:?}", other),
        }
    }
}

use crate::adapters::twilio::TwilioConfig;
use crate::config::toml_config::TomlConfig;
use crate::domain::model::RetryPolicy;
use crate::domain::ports::ReminderSettings;
use crate::utils::error::{ReminderError, Result};
use crate::utils::validation::{validate_positive_number, validate_url, Validate};
use std::time::Duration;

/// Settings for a local run after merging flags, config file and environment.
#[derive(Debug, Clone, PartialEq)]
pub struct CliSettings {
    pub interval: Duration,
    pub payment_link_base: Option<String>,
    pub retry_policy: RetryPolicy,
    pub twilio: Option<TwilioConfig>,
}

impl CliSettings {
    /// Flags win over the file, the file wins over the environment.
    pub fn resolve(
        interval_flag: Option<u64>,
        link_flag: Option<String>,
        file: Option<&TomlConfig>,
    ) -> Result<Self> {
        let interval = match (interval_flag, file) {
            (Some(seconds), _) => Duration::from_secs(seconds),
            (None, Some(file)) => file.interval(),
            (None, None) => super::env_interval()?.ok_or_else(|| {
                ReminderError::MissingConfigError {
                    field: "interval_seconds".to_string(),
                }
            })?,
        };

        let payment_link_base =
            link_flag.or_else(|| file.and_then(|f| f.payment_link_base().map(str::to_string)));

        let twilio = match file.and_then(|f| f.twilio.clone()) {
            Some(twilio) => Some(twilio),
            None => TwilioConfig::from_env()?,
        };

        Ok(Self {
            interval,
            payment_link_base,
            retry_policy: file.map(|f| f.retry_policy()).unwrap_or_default(),
            twilio,
        })
    }
}

impl ReminderSettings for CliSettings {
    fn interval(&self) -> Duration {
        self.interval
    }

    fn payment_link_base(&self) -> Option<&str> {
        self.payment_link_base.as_deref()
    }

    fn retry_policy(&self) -> RetryPolicy {
        self.retry_policy
    }
}

impl Validate for CliSettings {
    fn validate(&self) -> Result<()> {
        validate_positive_number("interval_seconds", self.interval.as_secs(), 1)?;
        if let Some(base) = &self.payment_link_base {
            validate_url("payment_link_base", base)?;
        }
        if let Some(twilio) = &self.twilio {
            twilio.validate()?;
        }
        Ok(())
    }
}

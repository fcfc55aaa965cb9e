use crate::adapters::twilio::TwilioConfig;
use crate::domain::ports::ReminderSettings;
use crate::utils::error::{ReminderError, Result};
use crate::utils::validation::{validate_range, validate_url, Validate};
use std::env;
use std::time::Duration;

const DEFAULT_POLL_SECONDS: u64 = 5;

/// Settings for the Lambda host, read from the function's environment.
#[derive(Debug, Clone)]
pub struct LambdaConfig {
    pub interval: Duration,
    pub payment_link_base: Option<String>,
    pub payment_status_url: Option<String>,
    pub poll_interval: Duration,
    pub twilio: Option<TwilioConfig>,
}

impl LambdaConfig {
    pub fn from_env() -> Result<Self> {
        let interval = super::env_interval()?.ok_or_else(|| ReminderError::MissingConfigError {
            field: "SMS_INTERVAL".to_string(),
        })?;

        let poll_seconds = match env::var("PAYMENT_POLL_SECONDS") {
            Ok(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ReminderError::InvalidConfigValueError {
                    field: "PAYMENT_POLL_SECONDS".to_string(),
                    value: raw.clone(),
                    reason: "Expected a whole number of seconds".to_string(),
                })?,
            Err(_) => DEFAULT_POLL_SECONDS,
        };

        Ok(Self {
            interval,
            payment_link_base: env::var("PAYMENT_LINK_BASE").ok(),
            payment_status_url: env::var("PAYMENT_STATUS_URL").ok(),
            poll_interval: Duration::from_secs(poll_seconds),
            twilio: TwilioConfig::from_env()?,
        })
    }
}

impl ReminderSettings for LambdaConfig {
    fn interval(&self) -> Duration {
        self.interval
    }

    fn payment_link_base(&self) -> Option<&str> {
        self.payment_link_base.as_deref()
    }
}

impl Validate for LambdaConfig {
    fn validate(&self) -> Result<()> {
        if let Some(base) = &self.payment_link_base {
            validate_url("PAYMENT_LINK_BASE", base)?;
        }
        if let Some(status_url) = &self.payment_status_url {
            validate_url("PAYMENT_STATUS_URL", status_url)?;
        }
        validate_range("PAYMENT_POLL_SECONDS", self.poll_interval.as_secs(), 1, 300)?;

        match &self.twilio {
            Some(twilio) => twilio.validate()?,
            None => {
                return Err(ReminderError::MissingConfigError {
                    field: "TWILIO_ACCOUNT_SID".to_string(),
                })
            }
        }

        tracing::info!("✅ Lambda configuration validation passed");
        Ok(())
    }
}

use crate::adapters::twilio::TwilioConfig;
use crate::domain::model::RetryPolicy;
use crate::domain::ports::ReminderSettings;
use crate::utils::error::{ReminderError, Result};
use crate::utils::validation::{validate_positive_number, validate_range, validate_url, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub reminder: ReminderSection,
    pub twilio: Option<TwilioConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReminderSection {
    pub interval_seconds: u64,
    pub payment_link_base: Option<String>,
    pub send_retries: Option<u32>,
    pub send_retry_delay_ms: Option<u64>,
}

impl TomlConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        Ok(toml::from_str(&processed_content)?)
    }

    /// Replaces `${VAR}` with the environment value; unknown vars stay as-is.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReminderError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }
}

impl ReminderSettings for TomlConfig {
    fn interval(&self) -> Duration {
        Duration::from_secs(self.reminder.interval_seconds)
    }

    fn payment_link_base(&self) -> Option<&str> {
        self.reminder.payment_link_base.as_deref()
    }

    fn retry_policy(&self) -> RetryPolicy {
        let defaults = RetryPolicy::default();
        RetryPolicy::new(
            self.reminder.send_retries.unwrap_or(defaults.max_attempts),
            self.reminder
                .send_retry_delay_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.delay),
        )
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validate_positive_number("reminder.interval_seconds", self.reminder.interval_seconds, 1)?;

        if let Some(base) = &self.reminder.payment_link_base {
            validate_url("reminder.payment_link_base", base)?;
        }

        if let Some(retries) = self.reminder.send_retries {
            validate_range("reminder.send_retries", retries, 1, 10)?;
        }

        if let Some(twilio) = &self.twilio {
            twilio.validate()?;
        }

        Ok(())
    }
}

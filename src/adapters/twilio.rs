//! Twilio Programmable Messaging adapter

use crate::domain::model::ReminderMessage;
use crate::domain::ports::Notifier;
use crate::utils::error::{ReminderError, Result};
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwilioConfig {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

impl TwilioConfig {
    /// Reads `TWILIO_ACCOUNT_SID`, `TWILIO_AUTH_TOKEN` and
    /// `TWILIO_PHONE_NUMBER`, falling back to the legacy `TwilioAccountSid`,
    /// `TwilioAuthToken` and `TwilioPhoneNumber` names. Returns `None` when
    /// none of them is set.
    pub fn from_env() -> Result<Option<Self>> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Result<Option<Self>> {
        let first = |names: [&str; 2]| names.into_iter().find_map(|name| lookup(name));

        let account_sid = first(["TWILIO_ACCOUNT_SID", "TwilioAccountSid"]);
        let auth_token = first(["TWILIO_AUTH_TOKEN", "TwilioAuthToken"]);
        let from_number = first(["TWILIO_PHONE_NUMBER", "TwilioPhoneNumber"]);

        if account_sid.is_none() && auth_token.is_none() && from_number.is_none() {
            return Ok(None);
        }

        let missing = |field: &str| ReminderError::MissingConfigError {
            field: field.to_string(),
        };

        Ok(Some(Self {
            account_sid: account_sid.ok_or_else(|| missing("TWILIO_ACCOUNT_SID"))?,
            auth_token: auth_token.ok_or_else(|| missing("TWILIO_AUTH_TOKEN"))?,
            from_number: from_number.ok_or_else(|| missing("TWILIO_PHONE_NUMBER"))?,
            api_base: lookup("TWILIO_API_BASE").unwrap_or_else(default_api_base),
        }))
    }

    pub fn messages_url(&self) -> String {
        format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.account_sid
        )
    }
}

impl Validate for TwilioConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("twilio.account_sid", &self.account_sid)?;
        validate_non_empty_string("twilio.auth_token", &self.auth_token)?;
        validate_non_empty_string("twilio.from_number", &self.from_number)?;
        validate_url("twilio.api_base", &self.api_base)?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: Option<String>,
    status: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TwilioNotifier {
    config: TwilioConfig,
    client: Client,
}

impl TwilioNotifier {
    pub fn new(config: TwilioConfig) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        Ok(Self { config, client })
    }
}

#[async_trait]
impl Notifier for TwilioNotifier {
    async fn send(&self, message: &ReminderMessage) -> Result<()> {
        tracing::info!("Sending reminder message to {}.", message.recipient);

        let params = [
            ("To", message.recipient.as_str()),
            ("From", self.config.from_number.as_str()),
            ("Body", message.body.as_str()),
        ];

        let response = self
            .client
            .post(self.config.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&params)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("Twilio response status: {}", status);

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReminderError::NotificationError {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        match response.json::<MessageResource>().await {
            Ok(resource) => tracing::debug!(
                "Twilio accepted message {} ({})",
                resource.sid.as_deref().unwrap_or("unknown sid"),
                resource.status.as_deref().unwrap_or("unknown status")
            ),
            Err(e) => tracing::warn!("Twilio accepted the message but the body was unreadable: {}", e),
        }

        Ok(())
    }
}

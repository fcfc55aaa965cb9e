use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReminderError {
    #[error("Invalid input for {field}: {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid configuration value for {field} ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("SMS delivery failed{}: {message}", status_suffix(.status))]
    NotificationError { status: Option<u16>, message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Signal error: {message}")]
    SignalError { message: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Delivery,
    Signal,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReminderError {
    pub fn invalid_input(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ReminderError::InvalidInput {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ReminderError::InvalidInput { .. } => ErrorCategory::Input,
            ReminderError::ConfigError { .. }
            | ReminderError::MissingConfigError { .. }
            | ReminderError::InvalidConfigValueError { .. }
            | ReminderError::TomlError(_) => ErrorCategory::Configuration,
            ReminderError::NotificationError { .. } | ReminderError::HttpError(_) => {
                ErrorCategory::Delivery
            }
            ReminderError::SignalError { .. } => ErrorCategory::Signal,
            ReminderError::IoError(_) | ReminderError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::Delivery | ErrorCategory::Signal => ErrorSeverity::Medium,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Whether retrying the same operation may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            ReminderError::HttpError(_) => true,
            ReminderError::NotificationError { status, .. } => {
                matches!(status, None | Some(429) | Some(500..=599))
            }
            _ => false,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ReminderError::InvalidInput { field, .. } => {
                format!("Provide a valid value for '{}' and start a new reminder run", field)
            }
            ReminderError::MissingConfigError { field } => {
                format!("Set '{}' in the config file or environment", field)
            }
            ReminderError::InvalidConfigValueError { field, .. } => {
                format!("Fix the value of '{}' in your configuration", field)
            }
            ReminderError::ConfigError { .. } | ReminderError::TomlError(_) => {
                "Check the configuration file syntax and required sections".to_string()
            }
            ReminderError::NotificationError { .. } | ReminderError::HttpError(_) => {
                "Check SMS provider credentials and network connectivity".to_string()
            }
            ReminderError::SignalError { .. } => {
                "Check the payment signal source is reachable".to_string()
            }
            ReminderError::IoError(_) | ReminderError::SerializationError(_) => {
                "Inspect the logs for details and retry".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Input => format!("Invalid reminder input: {}", self),
            ErrorCategory::Configuration => format!("Configuration problem: {}", self),
            ErrorCategory::Delivery => format!("Could not deliver the reminder: {}", self),
            ErrorCategory::Signal => format!("Could not receive payment signal: {}", self),
            ErrorCategory::System => format!("Unexpected failure: {}", self),
        }
    }
}

fn status_suffix(status: &Option<u16>) -> String {
    status
        .map(|code| format!(" (status {})", code))
        .unwrap_or_default()
}

pub type Result<T> = std::result::Result<T, ReminderError>;

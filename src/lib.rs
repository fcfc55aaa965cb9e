pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::{cli::CliSettings, lambda::LambdaConfig, toml_config::TomlConfig};
pub use core::{
    signal::{ChannelEventWaiter, EventHub, Signal},
    timer::TokioScheduler,
    workflow::ReminderWorkflow,
};
pub use domain::model::{InstanceId, PaymentOutcome, ReminderInput, ReminderMessage, WorkflowReport};
pub use utils::error::{ReminderError, Result};

use bill_reminder::adapters::{LogNotifier, StdinEventWaiter, TwilioNotifier};
use bill_reminder::domain::ports::Notifier;
use bill_reminder::utils::error::{ErrorSeverity, ReminderError};
use bill_reminder::utils::{logger, validation::Validate};
use bill_reminder::{
    CliConfig, CliSettings, InstanceId, ReminderWorkflow, TokioScheduler, TomlConfig,
};
use clap::Parser;
use std::sync::Arc;

fn exit_with(e: &ReminderError) -> ! {
    tracing::error!(
        "❌ Reminder run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.severity() {
        ErrorSeverity::Low => 0,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    };
    std::process::exit(exit_code);
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("🚀 Starting bill-reminder CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    let file = match config.config.as_deref() {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            match TomlConfig::from_file(path) {
                Ok(file) => Some(file),
                Err(e) => exit_with(&e),
            }
        }
        None => None,
    };

    let settings = match CliSettings::resolve(
        config.interval_seconds,
        config.payment_link_base.clone(),
        file.as_ref(),
    ) {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };

    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        exit_with(&e);
    }

    let notifier: Arc<dyn Notifier> = match (&settings.twilio, config.dry_run) {
        (Some(twilio), false) => match TwilioNotifier::new(twilio.clone()) {
            Ok(notifier) => Arc::new(notifier) as Arc<dyn Notifier>,
            Err(e) => exit_with(&e),
        },
        (None, false) => {
            tracing::warn!("No Twilio credentials configured, messages will only be logged");
            Arc::new(LogNotifier::new())
        }
        (_, true) => {
            tracing::info!("🔍 DRY RUN MODE - messages will only be logged");
            Arc::new(LogNotifier::new())
        }
    };

    let instance_id = config
        .instance_id
        .clone()
        .map(InstanceId::from)
        .unwrap_or_else(InstanceId::generate);
    tracing::info!("🆔 Instance id: {}", instance_id);
    tracing::info!("⌨️  Type a line on stdin to confirm payment");

    let input = config.reminder_input(&settings);
    let workflow = ReminderWorkflow::new(notifier, TokioScheduler::new(), settings);
    let mut waiter = StdinEventWaiter::stdin();

    match workflow
        .execute(&instance_id, input, &mut waiter)
        .await
    {
        Ok(report) => {
            tracing::info!(
                "✅ {} ({} reminder(s), {} message(s))",
                report.result,
                report.attempts,
                report.messages_sent
            );
            println!("{}", report.result);
        }
        Err(e) => exit_with(&e),
    }

    Ok(())
}

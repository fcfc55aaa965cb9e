#[cfg(feature = "lambda")]
use bill_reminder::adapters::{HttpPaymentWaiter, TwilioNotifier};
#[cfg(feature = "lambda")]
use bill_reminder::domain::ports::EventWaiter;
#[cfg(feature = "lambda")]
use bill_reminder::utils::logger;
#[cfg(feature = "lambda")]
use bill_reminder::utils::validation::{validate_required_field, Validate};
#[cfg(feature = "lambda")]
use bill_reminder::{
    ChannelEventWaiter, InstanceId, LambdaConfig, ReminderInput, ReminderWorkflow, TokioScheduler,
    WorkflowReport,
};
#[cfg(feature = "lambda")]
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
#[cfg(feature = "lambda")]
use serde::Deserialize;

#[cfg(feature = "lambda")]
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub instance_id: Option<String>,
    pub input: ReminderInput,
}

#[cfg(feature = "lambda")]
async fn function_handler(event: LambdaEvent<Request>) -> Result<WorkflowReport, Error> {
    let (request, context) = event.into_parts();
    let instance_id = request
        .instance_id
        .map(InstanceId::from)
        .unwrap_or_else(|| InstanceId::from(context.request_id.clone()));

    tracing::info!("Starting reminder Lambda function for instance {}", instance_id);

    let config = LambdaConfig::from_env()?;
    config.validate()?;

    let twilio = validate_required_field("TWILIO_ACCOUNT_SID", &config.twilio)?;
    let notifier = TwilioNotifier::new(twilio.clone())?;

    let mut waiter: Box<dyn EventWaiter> = match &config.payment_status_url {
        Some(status_url) => Box::new(HttpPaymentWaiter::new(
            status_url,
            &instance_id,
            config.poll_interval,
        )),
        None => {
            tracing::warn!("PAYMENT_STATUS_URL not set, payment can never be confirmed");
            let (_sender, waiter) = ChannelEventWaiter::channel();
            Box::new(waiter)
        }
    };

    let workflow = ReminderWorkflow::new(notifier, TokioScheduler::new(), config);
    let report = workflow
        .execute(&instance_id, request.input, &mut waiter)
        .await?;

    tracing::info!("Reminder Lambda function finished: {}", report.result);
    Ok(report)
}

#[cfg(feature = "lambda")]
#[tokio::main]
async fn main() -> Result<(), Error> {
    logger::init_lambda_logger();

    run(service_fn(function_handler)).await
}

#[cfg(not(feature = "lambda"))]
fn main() {}

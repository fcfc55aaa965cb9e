use crate::domain::model::{InstanceId, PAYMENT_EVENT};
use crate::domain::ports::EventWaiter;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// Waits for payment by polling `GET {status_url}/{instance_id}`.
///
/// `200` with a body means the payment event arrived and the body is its
/// payload. `404` and `204` mean not yet. Anything else, including transport
/// errors, is logged and polling continues.
#[derive(Debug, Clone)]
pub struct HttpPaymentWaiter {
    client: Client,
    url: String,
    poll_interval: Duration,
}

impl HttpPaymentWaiter {
    pub fn new(status_url: &str, instance_id: &InstanceId, poll_interval: Duration) -> Self {
        Self {
            client: Client::new(),
            url: format!("{}/{}", status_url.trim_end_matches('/'), instance_id),
            poll_interval,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn poll_once(&self) -> Option<String> {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("Payment status request failed: {}", e);
                return None;
            }
        };

        match response.status() {
            StatusCode::OK => match response.text().await {
                Ok(body) if !body.trim().is_empty() => Some(body),
                Ok(_) => None,
                Err(e) => {
                    tracing::warn!("Payment status body unreadable: {}", e);
                    None
                }
            },
            StatusCode::NOT_FOUND | StatusCode::NO_CONTENT => None,
            other => {
                tracing::warn!("Unexpected payment status response: {}", other);
                None
            }
        }
    }
}

#[async_trait]
impl EventWaiter for HttpPaymentWaiter {
    async fn wait_for_event(&mut self, name: &str) -> Result<String> {
        if name != PAYMENT_EVENT {
            tracing::debug!("No HTTP source for event '{}', waiting indefinitely", name);
            std::future::pending::<()>().await;
        }

        loop {
            if let Some(payload) = self.poll_once().await {
                tracing::debug!("Payment status endpoint reported payment");
                return Ok(payload);
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }
}

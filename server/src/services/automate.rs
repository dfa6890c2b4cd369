use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::config::WebhookConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookKind {
    Registration,
    EventSubmission,
    EventApproval,
    Revalidation,
}

impl WebhookKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WebhookKind::Registration => "registration",
            WebhookKind::EventSubmission => "event_submission",
            WebhookKind::EventApproval => "event_approval",
            WebhookKind::Revalidation => "revalidation",
        }
    }
}

/// Outbound notifications. Delivery failures never reach the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Returns whether the webhook accepted the payload.
    async fn notify(&self, kind: WebhookKind, payload: Value) -> bool;
}

pub struct AutomateNotifier {
    client: Client,
    webhooks: WebhookConfig,
}

impl AutomateNotifier {
    pub fn new(webhooks: WebhookConfig) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|e| {
                warn!("Falling back to default webhook client: {}", e);
                Client::new()
            });

        Self { client, webhooks }
    }

    fn url_for(&self, kind: WebhookKind) -> Option<&str> {
        match kind {
            WebhookKind::Registration => self.webhooks.registration.as_deref(),
            WebhookKind::EventSubmission => self.webhooks.submission.as_deref(),
            WebhookKind::EventApproval => self.webhooks.approval.as_deref(),
            WebhookKind::Revalidation => self.webhooks.revalidation.as_deref(),
        }
    }
}

#[async_trait]
impl Notifier for AutomateNotifier {
    async fn notify(&self, kind: WebhookKind, payload: Value) -> bool {
        let Some(url) = self.url_for(kind) else {
            warn!(webhook = kind.as_str(), "Webhook not configured, skipping notification");
            return false;
        };

        match self.client.post(url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!(webhook = kind.as_str(), "Webhook delivered");
                true
            }
            Ok(response) => {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                warn!(
                    webhook = kind.as_str(),
                    status = status.as_u16(),
                    body = %body,
                    "Webhook rejected notification"
                );
                false
            }
            Err(e) => {
                error!(webhook = kind.as_str(), error = %e, "Webhook request failed");
                false
            }
        }
    }
}

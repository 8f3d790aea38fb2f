use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::ports::{Notifier, NotifyError};

/// JSON document posted to the webhook
#[derive(Debug, Serialize)]
struct WebhookPayload<'a> {
    recipient: &'a str,
    subject: &'a str,
    body: &'a str,
}

/// Posts alerts to an HTTP endpoint (chat integrations, Alertmanager bridges)
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let payload = WebhookPayload {
            recipient,
            subject,
            body,
        };

        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Status(status.as_u16()));
        }

        Ok(())
    }

    fn channel(&self) -> &'static str {
        "webhook"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_shape() {
        let payload = WebhookPayload {
            recipient: "ops",
            subject: "Alert: db",
            body: "Memory Usage: 88.00%",
        };
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["recipient"], "ops");
        assert_eq!(value["subject"], "Alert: db");
        assert_eq!(value["body"], "Memory Usage: 88.00%");
    }
}

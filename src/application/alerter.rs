use std::sync::Arc;

use tracing::{error, info};

use crate::domain::{AlertMessage, ContainerHandle, UtilizationResult};
use crate::ports::Notifier;

/// Result of one alert send
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertDelivery {
    Sent,
    Failed(String),
}

impl AlertDelivery {
    pub fn is_sent(&self) -> bool {
        matches!(self, Self::Sent)
    }
}

/// Formats alerts and hands each one to the notifier exactly once.
/// Transport failures are logged and returned, never propagated.
pub struct Alerter {
    notifier: Arc<dyn Notifier>,
    recipient: String,
}

impl Alerter {
    pub fn new(notifier: Arc<dyn Notifier>, recipient: impl Into<String>) -> Self {
        Self {
            notifier,
            recipient: recipient.into(),
        }
    }

    pub async fn alert(&self, container: &ContainerHandle, utilization: &UtilizationResult) -> AlertDelivery {
        let message = AlertMessage::new(&container.name, utilization);

        match self
            .notifier
            .send(&self.recipient, &message.subject, &message.body)
            .await
        {
            Ok(()) => {
                info!(
                    container = %container.name,
                    channel = self.notifier.channel(),
                    "📧 Alert sent for container: {}",
                    container.name
                );
                AlertDelivery::Sent
            }
            Err(e) => {
                error!(
                    container = %container.name,
                    channel = self.notifier.channel(),
                    "❌ Failed to send alert: {}",
                    e
                );
                AlertDelivery::Failed(e.to_string())
            }
        }
    }
}

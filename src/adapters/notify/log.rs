use async_trait::async_trait;
use tracing::warn;

use crate::ports::{Notifier, NotifyError};

/// Used when no transport is configured; alerts only reach the log
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        warn!(recipient, subject, "{}", body.replace('\n', " | "));
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "log"
    }
}

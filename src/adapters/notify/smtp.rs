use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

use crate::config::SmtpSettings;
use crate::ports::{Notifier, NotifyError};

/// Sends alerts as plain-text mail over STARTTLS
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    sender: Mailbox,
}

impl SmtpNotifier {
    pub fn new(settings: &SmtpSettings) -> Result<Self, NotifyError> {
        let sender = parse_mailbox(&settings.sender)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)?
            .port(settings.port);
        if let Some(password) = &settings.password {
            let username = settings.username.clone().unwrap_or_else(|| settings.sender.clone());
            builder = builder.credentials(Credentials::new(username, password.clone()));
        }

        Ok(Self {
            transport: builder.build(),
            sender,
        })
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address
        .parse::<Mailbox>()
        .map_err(|_| NotifyError::Address(address.to_string()))
}

fn build_message(sender: &Mailbox, recipient: &str, subject: &str, body: &str) -> Result<Message, NotifyError> {
    Message::builder()
        .from(sender.clone())
        .to(parse_mailbox(recipient)?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body.to_string())
        .map_err(|e| NotifyError::Message(e.to_string()))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send(&self, recipient: &str, subject: &str, body: &str) -> Result<(), NotifyError> {
        let message = build_message(&self.sender, recipient, subject, body)?;
        self.transport.send(message).await?;
        Ok(())
    }

    fn channel(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_message_sets_headers() {
        let sender = parse_mailbox("monitor@example.com").unwrap();
        let message = build_message(&sender, "ops@example.com", "Alert: web", "CPU Usage: 91.00%").unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: monitor@example.com"));
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Subject: Alert: web"));
        assert!(raw.contains("CPU Usage: 91.00%"));
    }

    #[test]
    fn test_build_message_rejects_bad_recipient() {
        let sender = parse_mailbox("monitor@example.com").unwrap();
        let err = build_message(&sender, "not an address", "s", "b").unwrap_err();
        assert!(matches!(err, NotifyError::Address(_)));
    }
}

mod log;
mod smtp;
mod webhook;

pub use log::LogNotifier;
pub use smtp::SmtpNotifier;
pub use webhook::WebhookNotifier;

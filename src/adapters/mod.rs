pub mod docker;
pub mod notify;

pub use docker::DockerAdapter;
pub use notify::{LogNotifier, SmtpNotifier, WebhookNotifier};

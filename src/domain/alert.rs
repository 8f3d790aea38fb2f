use super::UtilizationResult;

/// Notification raised for a container over its thresholds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertMessage {
    pub container: String,
    pub subject: String,
    pub body: String,
}

impl AlertMessage {
    pub fn new(container: impl Into<String>, utilization: &UtilizationResult) -> Self {
        let container = container.into();
        let subject = format!("⚠️ Docker Container Alert: {}", container);
        let body = format!(
            "Container: {}\nCPU Usage: {:.2}%\nMemory Usage: {:.2}%\n\n\
             Action Required: Please check the container's performance immediately.",
            container, utilization.cpu_percent, utilization.memory_percent
        );

        Self {
            container,
            subject,
            body,
        }
    }
}

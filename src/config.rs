use std::env;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::domain::AlertThresholds;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
}

/// SMTP relay used for email alerts
#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub sender: String,
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            server: "smtp.gmail.com".to_string(),
            port: 587,
            username: None,
            password: None,
            sender: String::new(),
        }
    }
}

impl fmt::Debug for SmtpSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SmtpSettings")
            .field("server", &self.server)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("sender", &self.sender)
            .finish()
    }
}

#[derive(Clone, Deserialize)]
#[serde(default)]
pub struct WebhookSettings {
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for WebhookSettings {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 10,
        }
    }
}

// Webhook URLs often carry a token in the path or query
impl fmt::Debug for WebhookSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookSettings")
            .field("url", &self.url.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Application configuration, loaded once at startup
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    /// Upper bound for a single exec call (probe or launch)
    pub exec_timeout_secs: u64,
    /// Address that receives alerts
    pub recipient: Option<String>,
    pub thresholds: AlertThresholds,
    pub smtp: SmtpSettings,
    pub webhook: WebhookSettings,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            exec_timeout_secs: 30,
            recipient: None,
            thresholds: AlertThresholds::default(),
            smtp: SmtpSettings::default(),
            webhook: WebhookSettings::default(),
        }
    }
}

impl Config {
    /// Load the optional TOML file (`path`, else `DOCKGUARD_CONFIG`), then
    /// apply `DOCKGUARD_*` environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = path
            .map(Path::to_path_buf)
            .or_else(|| env::var("DOCKGUARD_CONFIG").ok().map(PathBuf::from));

        let mut config = match file {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(toml::from_str(&content)?)
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<(), ConfigError> {
        override_value(&lookup, "DOCKGUARD_LOG_LEVEL", &mut self.log_level)?;
        override_value(&lookup, "DOCKGUARD_EXEC_TIMEOUT", &mut self.exec_timeout_secs)?;
        override_value(&lookup, "DOCKGUARD_CPU_THRESHOLD", &mut self.thresholds.cpu_threshold_percent)?;
        override_value(&lookup, "DOCKGUARD_MEM_THRESHOLD", &mut self.thresholds.memory_threshold_percent)?;
        override_value(&lookup, "DOCKGUARD_SMTP_SERVER", &mut self.smtp.server)?;
        override_value(&lookup, "DOCKGUARD_SMTP_PORT", &mut self.smtp.port)?;
        override_value(&lookup, "DOCKGUARD_EMAIL_SENDER", &mut self.smtp.sender)?;
        override_option(&lookup, "DOCKGUARD_SMTP_USERNAME", &mut self.smtp.username);
        override_option(&lookup, "DOCKGUARD_SMTP_PASSWORD", &mut self.smtp.password);
        override_option(&lookup, "DOCKGUARD_EMAIL_RECEIVER", &mut self.recipient);
        override_option(&lookup, "DOCKGUARD_WEBHOOK_URL", &mut self.webhook.url);
        Ok(())
    }

    fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("thresholds.cpu_percent", self.thresholds.cpu_threshold_percent),
            ("thresholds.memory_percent", self.thresholds.memory_threshold_percent),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string(),
                });
            }
        }

        if self.exec_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "exec_timeout_secs".to_string(),
                value: "0".to_string(),
            });
        }

        Ok(())
    }

    pub fn exec_timeout(&self) -> Duration {
        Duration::from_secs(self.exec_timeout_secs)
    }

    pub fn webhook_timeout(&self) -> Duration {
        Duration::from_secs(self.webhook.timeout_secs)
    }

    /// True when enough is set to send mail
    pub fn email_enabled(&self) -> bool {
        !self.smtp.sender.is_empty() && self.recipient.is_some()
    }
}

fn override_value<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    target: &mut T,
) -> Result<(), ConfigError> {
    if let Some(raw) = lookup(key) {
        *target = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.clone(),
        })?;
    }
    Ok(())
}

fn override_option(lookup: &impl Fn(&str) -> Option<String>, key: &str, target: &mut Option<String>) {
    if let Some(raw) = lookup(key).filter(|v| !v.is_empty()) {
        *target = Some(raw);
    }
}

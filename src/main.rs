use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dockguard::adapters::{DockerAdapter, LogNotifier, SmtpNotifier, WebhookNotifier};
use dockguard::application::{Alerter, LoadInjector, MonitoringService};
use dockguard::config::Config;
use dockguard::domain::{ContainerId, StressMode, StressSpec};
use dockguard::interface::cli::{Cli, Command};
use dockguard::ports::{Notifier, NotifyError};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("dockguard={}", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting dockguard v{}", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {:?}", config);

    let docker = Arc::new(DockerAdapter::new(config.exec_timeout())?);
    if let Err(e) = docker.ping().await {
        warn!("⚠ Failed to connect to Docker: {}", e);
        return Err(e.into());
    }
    info!("✓ Connected to Docker daemon");

    match cli.command {
        Command::Monitor { interval } => run_monitor(&config, docker, interval).await,
        Command::Stress {
            containers,
            mode,
            duration,
        } => run_stress(docker, containers, mode, duration).await,
    }
}

/// Pick the alert channel: webhook if configured, else email, else log only
fn build_notifier(config: &Config) -> Result<Arc<dyn Notifier>, NotifyError> {
    if let Some(url) = &config.webhook.url {
        return Ok(Arc::new(WebhookNotifier::new(url.clone(), config.webhook_timeout())?));
    }
    if config.email_enabled() {
        return Ok(Arc::new(SmtpNotifier::new(&config.smtp)?));
    }
    warn!("⚠ No alert transport configured, alerts will only be logged");
    Ok(Arc::new(LogNotifier))
}

async fn run_monitor(config: &Config, docker: Arc<DockerAdapter>, interval: Option<u64>) -> Result<(), BoxError> {
    let notifier = build_notifier(config)?;
    info!("✓ Alerts go to {} channel", notifier.channel());

    let alerter = Alerter::new(notifier, config.recipient.clone().unwrap_or_default());
    let service = MonitoringService::new(docker, config.thresholds, alerter);

    let Some(secs) = interval else {
        service.run_pass().await?;
        return Ok(());
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("❌ Failed to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    };
    service.run_until(Duration::from_secs(secs), shutdown).await;

    Ok(())
}

async fn run_stress(
    docker: Arc<DockerAdapter>,
    containers: Vec<String>,
    mode: StressMode,
    duration: u64,
) -> Result<(), BoxError> {
    let targets = containers.into_iter().map(ContainerId::from).collect();
    let spec = StressSpec::new(mode, duration, targets)?;

    let injector = LoadInjector::new(docker.clone(), docker);
    injector.run(&spec).await;

    Ok(())
}

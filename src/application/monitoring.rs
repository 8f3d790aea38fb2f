use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

use super::alerter::{AlertDelivery, Alerter};
use crate::domain::{AlertThresholds, ContainerHandle, UtilizationResult};
use crate::ports::{ContainerSource, SourceError};

/// What happened to one container during a pass
#[derive(Debug, Clone, PartialEq)]
pub enum ContainerOutcome {
    Healthy(UtilizationResult),
    Alerted {
        utilization: UtilizationResult,
        delivery: AlertDelivery,
    },
    FetchFailed(String),
}

/// Summary of one monitoring pass
#[derive(Debug, Clone)]
pub struct PassReport {
    pub started_at: DateTime<Utc>,
    pub results: Vec<(ContainerHandle, ContainerOutcome)>,
}

impl PassReport {
    fn new() -> Self {
        Self {
            started_at: Utc::now(),
            results: Vec::new(),
        }
    }

    pub fn healthy(&self) -> usize {
        self.count(|o| matches!(o, ContainerOutcome::Healthy(_)))
    }

    pub fn alerted(&self) -> usize {
        self.count(|o| matches!(o, ContainerOutcome::Alerted { .. }))
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ContainerOutcome::FetchFailed(_)))
    }

    fn count(&self, pred: impl Fn(&ContainerOutcome) -> bool) -> usize {
        self.results.iter().filter(|(_, o)| pred(o)).count()
    }
}

/// Fetch, compute, evaluate and alert for every running container
pub struct MonitoringService {
    source: Arc<dyn ContainerSource>,
    thresholds: AlertThresholds,
    alerter: Alerter,
}

impl MonitoringService {
    pub fn new(source: Arc<dyn ContainerSource>, thresholds: AlertThresholds, alerter: Alerter) -> Self {
        Self {
            source,
            thresholds,
            alerter,
        }
    }

    /// One full pass. Only a failure to list containers ends the pass early;
    /// per-container failures are recorded and the pass moves on.
    pub async fn run_pass(&self) -> Result<PassReport, SourceError> {
        let containers = self.source.list_containers().await?;
        let mut report = PassReport::new();

        for handle in containers {
            let outcome = self.check_container(&handle).await;
            report.results.push((handle, outcome));
        }

        info!(
            started_at = %report.started_at,
            healthy = report.healthy(),
            alerted = report.alerted(),
            failed = report.failed(),
            "Pass complete"
        );

        Ok(report)
    }

    /// Run a pass every `period` until `shutdown` resolves. The shutdown
    /// future is polled during passes as well as between them.
    pub async fn run_until(&self, period: Duration, shutdown: impl Future<Output = ()>) {
        tokio::pin!(shutdown);

        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                _ = ticker.tick() => {}
            }

            tokio::select! {
                _ = &mut shutdown => break,
                result = self.run_pass() => {
                    if let Err(e) = result {
                        error!("❌ Failed to list containers: {}", e);
                    }
                }
            }
        }

        info!("Shutting down");
    }

    pub async fn check_container(&self, handle: &ContainerHandle) -> ContainerOutcome {
        let sample = match self.source.fetch_stats(handle).await {
            Ok(sample) => sample,
            Err(e) => {
                error!(container = %handle.name, "❌ Error fetching stats for {}: {}", handle.name, e);
                return ContainerOutcome::FetchFailed(e.to_string());
            }
        };

        let utilization = sample.utilization();
        info!(
            container = %handle.name,
            "Container: {}  CPU: {:.2}%  Memory: {:.2}%",
            handle.name,
            utilization.cpu_percent,
            utilization.memory_percent
        );

        let decision = self.thresholds.evaluate(&utilization);
        if !decision.should_alert() {
            info!(container = %handle.name, "✅ Healthy");
            return ContainerOutcome::Healthy(utilization);
        }

        warn!(
            container = %handle.name,
            cpu_breached = decision.cpu_breached,
            memory_breached = decision.memory_breached,
            "Threshold exceeded"
        );
        let delivery = self.alerter.alert(handle, &utilization).await;

        ContainerOutcome::Alerted {
            utilization,
            delivery,
        }
    }
}

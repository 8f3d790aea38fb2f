use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use bollard::container::{InspectContainerOptions, ListContainersOptions, Stats, StatsOptions};
use bollard::errors::Error as BollardError;
use bollard::exec::{CreateExecOptions, StartExecOptions, StartExecResults};
use bollard::Docker;
use futures::stream::StreamExt;
use tracing::debug;

use crate::domain::{ContainerHandle, ContainerId, CpuSnapshot, RawStatsSample};
use crate::ports::{ContainerExec, ContainerSource, ExecError, ExecOutput, SourceError};

/// Counters pulled out of one Docker stats document. Docker fills
/// `precpu_stats` with the reading taken just before `cpu_stats`.
#[derive(Debug, Clone, Default)]
struct StatsReading {
    pre_total: u64,
    pre_system: Option<u64>,
    total: u64,
    system: Option<u64>,
    percpu_len: Option<usize>,
    online_cpus: Option<u64>,
    memory_usage: Option<u64>,
    memory_limit: Option<u64>,
}

impl From<&Stats> for StatsReading {
    fn from(stats: &Stats) -> Self {
        Self {
            pre_total: stats.precpu_stats.cpu_usage.total_usage,
            pre_system: stats.precpu_stats.system_cpu_usage,
            total: stats.cpu_stats.cpu_usage.total_usage,
            system: stats.cpu_stats.system_cpu_usage,
            percpu_len: stats.cpu_stats.cpu_usage.percpu_usage.as_ref().map(Vec::len),
            online_cpus: stats.cpu_stats.online_cpus,
            memory_usage: stats.memory_stats.usage,
            memory_limit: stats.memory_stats.limit,
        }
    }
}

impl StatsReading {
    /// Validate the reading into a sample. Both system counters must be
    /// present and the memory limit must be non-zero.
    fn into_sample(self, id: &ContainerId) -> Result<RawStatsSample, SourceError> {
        let missing = |field: &'static str| SourceError::MissingField {
            container: id.clone(),
            field,
        };

        let system = self.system.ok_or_else(|| missing("cpu_stats.system_cpu_usage"))?;
        let pre_system = self
            .pre_system
            .ok_or_else(|| missing("precpu_stats.system_cpu_usage"))?;

        // cgroup v2 hosts leave percpu_usage empty; online_cpus is set there
        let cpu_count = self
            .percpu_len
            .map(|n| n as u64)
            .filter(|n| *n > 0)
            .or(self.online_cpus)
            .ok_or_else(|| missing("cpu_stats.online_cpus"))?;

        let memory_usage = self.memory_usage.ok_or_else(|| missing("memory_stats.usage"))?;
        let memory_limit = self.memory_limit.ok_or_else(|| missing("memory_stats.limit"))?;
        if memory_limit == 0 {
            return Err(SourceError::ZeroMemoryLimit(id.clone()));
        }

        let sample = RawStatsSample::new(
            id.clone(),
            CpuSnapshot::new(self.pre_total, pre_system),
            CpuSnapshot::new(self.total, system),
            cpu_count as u32,
        )
        .with_memory(memory_usage, memory_limit);

        Ok(sample)
    }
}

/// Docker adapter using bollard client
pub struct DockerAdapter {
    client: Docker,
    exec_timeout: Duration,
}

impl DockerAdapter {
    /// Connect using `DOCKER_HOST` or the platform default socket
    pub fn new(exec_timeout: Duration) -> Result<Self, BollardError> {
        let client = Docker::connect_with_local_defaults()?;
        Ok(Self {
            client,
            exec_timeout,
        })
    }

    pub async fn ping(&self) -> Result<(), BollardError> {
        self.client.ping().await.map(|_| ())
    }

    fn parse_container_name(names: &Option<Vec<String>>) -> String {
        names
            .as_ref()
            .and_then(|n| n.first())
            .map(|s| s.trim_start_matches('/').to_string())
            .unwrap_or_else(|| "unknown".to_string())
    }

    fn is_not_found(err: &BollardError) -> bool {
        matches!(
            err,
            BollardError::DockerResponseServerError { status_code: 404, .. }
        )
    }

    /// Create, start and collect one exec; the caller bounds the whole call
    async fn run_exec(
        &self,
        handle: &ContainerHandle,
        argv: &[String],
        detached: bool,
    ) -> Result<ExecOutput, ExecError> {
        let created = self
            .client
            .create_exec(
                handle.id.as_str(),
                CreateExecOptions {
                    cmd: Some(argv.to_vec()),
                    attach_stdout: Some(!detached),
                    attach_stderr: Some(!detached),
                    ..Default::default()
                },
            )
            .await?;

        debug!(container = %handle.name, exec_id = %created.id, detached, "exec created");

        self.start_and_collect(&created.id, detached).await
    }

    /// Start a created exec and, when attached, drain its output before
    /// reading the exit code
    async fn start_and_collect(&self, exec_id: &str, detached: bool) -> Result<ExecOutput, ExecError> {
        let results = self
            .client
            .start_exec(
                exec_id,
                Some(StartExecOptions {
                    detach: detached,
                    ..Default::default()
                }),
            )
            .await?;

        let mut output = String::new();

        if let StartExecResults::Attached { output: mut stream, .. } = results {
            while let Some(chunk) = stream.next().await {
                output.push_str(&chunk?.to_string());
            }
        }

        let inspect = self.client.inspect_exec(exec_id).await?;
        Ok(ExecOutput::new(inspect.exit_code, output))
    }
}

#[async_trait]
impl ContainerSource for DockerAdapter {
    async fn list_containers(&self) -> Result<Vec<ContainerHandle>, SourceError> {
        let options = Some(ListContainersOptions::<String> {
            all: false,
            ..Default::default()
        });

        let containers = self
            .client
            .list_containers(options)
            .await?
            .into_iter()
            .map(|summary| {
                let name = Self::parse_container_name(&summary.names);
                ContainerHandle::new(ContainerId::new(summary.id.unwrap_or_default()), name)
            })
            .collect();

        Ok(containers)
    }

    async fn get_handle(&self, id: &ContainerId) -> Result<ContainerHandle, SourceError> {
        let inspect = self
            .client
            .inspect_container(id.as_str(), None::<InspectContainerOptions>)
            .await
            .map_err(|e| {
                if Self::is_not_found(&e) {
                    SourceError::NotFound(id.clone())
                } else {
                    SourceError::Docker(e)
                }
            })?;

        let full_id = inspect.id.map(ContainerId::new).unwrap_or_else(|| id.clone());
        let name = inspect
            .name
            .map(|n| n.trim_start_matches('/').to_string())
            .unwrap_or_else(|| id.as_str().to_string());

        Ok(ContainerHandle::new(full_id, name))
    }

    async fn fetch_stats(&self, handle: &ContainerHandle) -> Result<RawStatsSample, SourceError> {
        // one_shot would skip the second reading and leave precpu_stats empty
        let mut stream = self.client.stats(
            handle.id.as_str(),
            Some(StatsOptions {
                stream: false,
                one_shot: false,
            }),
        );

        let stats = stream
            .next()
            .await
            .ok_or_else(|| SourceError::NoStats(handle.id.clone()))??;

        StatsReading::from(&stats).into_sample(&handle.id)
    }
}

#[async_trait]
impl ContainerExec for DockerAdapter {
    async fn exec(
        &self,
        handle: &ContainerHandle,
        argv: &[String],
        detached: bool,
    ) -> Result<ExecOutput, ExecError> {
        bounded(self.exec_timeout, self.run_exec(handle, argv, detached)).await
    }
}

/// Run an exec future under `limit`. Expiry reports the limit in seconds.
async fn bounded<T>(
    limit: Duration,
    fut: impl Future<Output = Result<T, ExecError>>,
) -> Result<T, ExecError> {
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| ExecError::Timeout(limit.as_secs()))?
}

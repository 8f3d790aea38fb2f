use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ContainerHandle, ContainerId, RawStatsSample};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("container not found: {0}")]
    NotFound(ContainerId),

    #[error("no stats available for {0}")]
    NoStats(ContainerId),

    #[error("missing counter `{field}` in stats for {container}")]
    MissingField {
        container: ContainerId,
        field: &'static str,
    },

    #[error("memory limit reported as zero for {0}")]
    ZeroMemoryLimit(ContainerId),
}

/// Port for discovering containers and reading their raw counters
#[async_trait]
pub trait ContainerSource: Send + Sync {
    /// List running containers
    async fn list_containers(&self) -> Result<Vec<ContainerHandle>, SourceError>;

    /// Resolve a container name or id to a handle
    async fn get_handle(&self, id: &ContainerId) -> Result<ContainerHandle, SourceError>;

    /// Fetch a pre/current counter pair for one container. Implementations
    /// reject degenerate readings (zero memory limit) with an error.
    async fn fetch_stats(&self, handle: &ContainerHandle) -> Result<RawStatsSample, SourceError>;
}

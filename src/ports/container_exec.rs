use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ContainerHandle;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("Docker API error: {0}")]
    Docker(#[from] bollard::errors::Error),

    #[error("exec did not finish within {0}s")]
    Timeout(u64),
}

/// Result of running a command inside a container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecOutput {
    /// `None` while the command is still running (detached) or when the
    /// runtime did not report one
    pub exit_code: Option<i64>,
    pub output: String,
}

impl ExecOutput {
    pub fn new(exit_code: Option<i64>, output: impl Into<String>) -> Self {
        Self {
            exit_code,
            output: output.into(),
        }
    }
}

/// Port for executing commands inside containers
#[async_trait]
pub trait ContainerExec: Send + Sync {
    /// Run `argv` in the container. When `detached` is set the call returns
    /// as soon as the runtime accepts the command.
    async fn exec(
        &self,
        handle: &ContainerHandle,
        argv: &[String],
        detached: bool,
    ) -> Result<ExecOutput, ExecError>;
}

pub mod container_exec;
pub mod container_source;
pub mod notifier;

pub use container_exec::{ContainerExec, ExecError, ExecOutput};
pub use container_source::{ContainerSource, SourceError};
pub use notifier::{Notifier, NotifyError};

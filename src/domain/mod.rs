pub mod alert;
pub mod container;
pub mod metrics;
pub mod stress;
pub mod thresholds;

pub use alert::AlertMessage;
pub use container::{ContainerHandle, ContainerId};
pub use metrics::{CpuSnapshot, RawStatsSample, UtilizationResult};
pub use stress::{
    Capability, CommandSource, ResolvedCommand, StressMode, StressSpec, StressSpecError, FALLBACK_INTERPRETER,
    STRESS_TOOL,
};
pub use thresholds::{AlertDecision, AlertThresholds};

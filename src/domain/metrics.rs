use super::ContainerId;

/// Point-in-time reading of the cumulative CPU counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuSnapshot {
    /// Total CPU time consumed by the container (ns)
    pub total_usage: u64,
    /// Total CPU time of the host at the same instant (ns)
    pub system_usage: u64,
}

impl CpuSnapshot {
    pub fn new(total_usage: u64, system_usage: u64) -> Self {
        Self {
            total_usage,
            system_usage,
        }
    }
}

/// Raw counters for one container: the previous ("pre") and current CPU
/// snapshots plus the memory reading taken with the current one.
///
/// Both snapshots are bound to `container` at construction, so a sample
/// can never pair readings from two different containers.
#[derive(Debug, Clone, PartialEq)]
pub struct RawStatsSample {
    pub container: ContainerId,
    pub pre: CpuSnapshot,
    pub current: CpuSnapshot,
    pub cpu_count: u32,
    pub memory_usage_bytes: u64,
    pub memory_limit_bytes: u64,
}

impl RawStatsSample {
    pub fn new(container: ContainerId, pre: CpuSnapshot, current: CpuSnapshot, cpu_count: u32) -> Self {
        Self {
            container,
            pre,
            current,
            cpu_count,
            memory_usage_bytes: 0,
            memory_limit_bytes: 0,
        }
    }

    pub fn with_memory(mut self, usage_bytes: u64, limit_bytes: u64) -> Self {
        self.memory_usage_bytes = usage_bytes;
        self.memory_limit_bytes = limit_bytes;
        self
    }

    /// Container CPU time consumed between the two snapshots.
    /// Signed so that a counter reset shows up as a negative delta.
    pub fn cpu_delta(&self) -> f64 {
        self.current.total_usage as f64 - self.pre.total_usage as f64
    }

    /// Host CPU time elapsed between the two snapshots
    pub fn system_delta(&self) -> f64 {
        self.current.system_usage as f64 - self.pre.system_usage as f64
    }

    pub fn utilization(&self) -> UtilizationResult {
        UtilizationResult::from_sample(self)
    }
}

/// Normalized utilization derived from one [`RawStatsSample`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UtilizationResult {
    pub cpu_percent: f64,
    pub memory_percent: f64,
}

impl UtilizationResult {
    pub fn new(cpu_percent: f64, memory_percent: f64) -> Self {
        Self {
            cpu_percent,
            memory_percent,
        }
    }

    /// CPU is `cpu_delta / system_delta * cpus * 100`, or `0.0` unless both
    /// deltas are positive. Memory is `usage / limit * 100` and is not
    /// clamped; a zero limit must be rejected by the stats source.
    pub fn from_sample(sample: &RawStatsSample) -> Self {
        let cpu_delta = sample.cpu_delta();
        let system_delta = sample.system_delta();

        let cpu_percent = if system_delta > 0.0 && cpu_delta > 0.0 {
            (cpu_delta / system_delta) * sample.cpu_count as f64 * 100.0
        } else {
            0.0
        };

        let memory_percent =
            (sample.memory_usage_bytes as f64 * 100.0) / sample.memory_limit_bytes as f64;

        Self {
            cpu_percent,
            memory_percent,
        }
    }
}

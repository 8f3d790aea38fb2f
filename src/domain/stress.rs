use std::fmt;

use thiserror::Error;

use super::ContainerId;

/// External load generator looked up inside each container
pub const STRESS_TOOL: &str = "stress-ng";
/// Interpreter used when the load generator is missing
pub const FALLBACK_INTERPRETER: &str = "python3";

const CPU_WORKERS: u32 = 4;
const VM_WORKERS: u32 = 2;
const VM_BYTES: &str = "90%";

/// Four threads, each grinding through a fixed batch of square roots.
/// Runs until the batch is done; the requested duration is not enforced.
const CPU_FALLBACK_SCRIPT: &str = "import threading,math;[threading.Thread(target=lambda: [math.sqrt(i) for i in range(10**7)]).start() for _ in range(4)]";

/// Appends 1 MB strings forever. Only the container memory limit or an
/// operator stops it.
const MEMORY_FALLBACK_SCRIPT: &str = "a=[]\nwhile True: a.append(\"x\"*10**6)";

/// Kind of synthetic load to inject
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum StressMode {
    Cpu,
    #[value(name = "mem")]
    Memory,
    Both,
}

impl fmt::Display for StressMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StressMode::Cpu => write!(f, "cpu"),
            StressMode::Memory => write!(f, "mem"),
            StressMode::Both => write!(f, "both"),
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StressSpecError {
    #[error("at least one target container is required")]
    NoTargets,

    #[error("duration must be a positive number of seconds")]
    ZeroDuration,
}

/// One load-injection request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StressSpec {
    mode: StressMode,
    duration_seconds: u64,
    targets: Vec<ContainerId>,
}

impl StressSpec {
    pub fn new(
        mode: StressMode,
        duration_seconds: u64,
        targets: Vec<ContainerId>,
    ) -> Result<Self, StressSpecError> {
        if targets.is_empty() {
            return Err(StressSpecError::NoTargets);
        }
        if duration_seconds == 0 {
            return Err(StressSpecError::ZeroDuration);
        }

        Ok(Self {
            mode,
            duration_seconds,
            targets,
        })
    }

    pub fn mode(&self) -> StressMode {
        self.mode
    }

    pub fn duration_seconds(&self) -> u64 {
        self.duration_seconds
    }

    pub fn targets(&self) -> &[ContainerId] {
        &self.targets
    }
}

/// Whether the load generator is present in a container.
/// A failed lookup is reported as `Unavailable`, never as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Available,
    Unavailable,
}

/// Which branch produced a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandSource {
    Tool,
    Fallback,
}

/// Fully resolved command to run inside a container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCommand {
    pub argv: Vec<String>,
    pub source: CommandSource,
}

impl ResolvedCommand {
    /// Pick the load command for `mode`.
    ///
    /// With the tool present every mode maps onto `stress-ng` flags. Without
    /// it the CPU and memory modes fall back to python scripts, and `Both`
    /// reuses the CPU script (there is no combined fallback).
    pub fn select(mode: StressMode, duration_seconds: u64, capability: Capability) -> Self {
        match capability {
            Capability::Available => Self::tool(mode, duration_seconds),
            Capability::Unavailable => Self::fallback(mode),
        }
    }

    fn tool(mode: StressMode, duration_seconds: u64) -> Self {
        let mut argv = vec![STRESS_TOOL.to_string()];

        if matches!(mode, StressMode::Cpu | StressMode::Both) {
            argv.extend(["--cpu".to_string(), CPU_WORKERS.to_string()]);
        }
        if matches!(mode, StressMode::Memory | StressMode::Both) {
            argv.extend([
                "--vm".to_string(),
                VM_WORKERS.to_string(),
                "--vm-bytes".to_string(),
                VM_BYTES.to_string(),
            ]);
        }
        argv.extend(["--timeout".to_string(), duration_seconds.to_string()]);

        Self {
            argv,
            source: CommandSource::Tool,
        }
    }

    fn fallback(mode: StressMode) -> Self {
        let script = match mode {
            StressMode::Memory => MEMORY_FALLBACK_SCRIPT,
            StressMode::Cpu | StressMode::Both => CPU_FALLBACK_SCRIPT,
        };

        Self {
            argv: vec![
                FALLBACK_INTERPRETER.to_string(),
                "-c".to_string(),
                script.to_string(),
            ],
            source: CommandSource::Fallback,
        }
    }

    pub fn is_fallback(&self) -> bool {
        self.source == CommandSource::Fallback
    }
}

impl fmt::Display for ResolvedCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, arg) in self.argv.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            if arg.chars().any(|c| c.is_whitespace() || c == '"' || c == ';') {
                write!(f, "'{}'", arg)?;
            } else {
                f.write_str(arg)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tool_cpu_command() {
        let cmd = ResolvedCommand::select(StressMode::Cpu, 60, Capability::Available);
        assert_eq!(cmd.to_string(), "stress-ng --cpu 4 --timeout 60");
        assert_eq!(cmd.source, CommandSource::Tool);
    }

    #[test]
    fn test_tool_memory_command() {
        let cmd = ResolvedCommand::select(StressMode::Memory, 45, Capability::Available);
        assert_eq!(cmd.to_string(), "stress-ng --vm 2 --vm-bytes 90% --timeout 45");
    }

    #[test]
    fn test_tool_both_combines_flags() {
        let cmd = ResolvedCommand::select(StressMode::Both, 30, Capability::Available);
        assert_eq!(
            cmd.argv,
            vec!["stress-ng", "--cpu", "4", "--vm", "2", "--vm-bytes", "90%", "--timeout", "30"]
        );
    }

    #[test]
    fn test_fallback_cpu_uses_threaded_script() {
        let cmd = ResolvedCommand::select(StressMode::Cpu, 60, Capability::Unavailable);
        assert!(cmd.is_fallback());
        assert_eq!(cmd.argv[0], "python3");
        assert_eq!(cmd.argv[1], "-c");
        assert!(cmd.argv[2].contains("threading.Thread"));
        assert!(cmd.argv[2].contains("range(4)"));
    }

    #[test]
    fn test_fallback_memory_ignores_duration() {
        let short = ResolvedCommand::select(StressMode::Memory, 1, Capability::Unavailable);
        let long = ResolvedCommand::select(StressMode::Memory, 3600, Capability::Unavailable);
        assert_eq!(short, long);
        assert!(short.argv[2].contains("while True"));
    }

    #[test]
    fn test_fallback_both_reuses_cpu_script() {
        let both = ResolvedCommand::select(StressMode::Both, 60, Capability::Unavailable);
        let cpu = ResolvedCommand::select(StressMode::Cpu, 60, Capability::Unavailable);
        assert_eq!(both, cpu);
    }

    #[test]
    fn test_selection_is_deterministic() {
        for mode in [StressMode::Cpu, StressMode::Memory, StressMode::Both] {
            for capability in [Capability::Available, Capability::Unavailable] {
                assert_eq!(
                    ResolvedCommand::select(mode, 90, capability).to_string(),
                    ResolvedCommand::select(mode, 90, capability).to_string()
                );
            }
        }
    }

    #[test]
    fn test_display_quotes_scripts() {
        let cmd = ResolvedCommand::select(StressMode::Cpu, 60, Capability::Unavailable);
        let rendered = cmd.to_string();
        assert!(rendered.starts_with("python3 -c 'import threading"));
        assert!(rendered.ends_with("range(4)]'"));
    }

    #[test]
    fn test_spec_rejects_empty_targets() {
        assert_eq!(
            StressSpec::new(StressMode::Cpu, 60, vec![]),
            Err(StressSpecError::NoTargets)
        );
    }

    #[test]
    fn test_spec_rejects_zero_duration() {
        assert_eq!(
            StressSpec::new(StressMode::Cpu, 0, vec![ContainerId::new("web")]),
            Err(StressSpecError::ZeroDuration)
        );
    }

    #[test]
    fn test_spec_keeps_target_order() {
        let spec = StressSpec::new(
            StressMode::Both,
            10,
            vec![ContainerId::new("b"), ContainerId::new("a")],
        )
        .unwrap();
        assert_eq!(spec.targets()[0].as_str(), "b");
        assert_eq!(spec.targets()[1].as_str(), "a");
    }
}

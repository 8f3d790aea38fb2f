use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::domain::{
    Capability, CommandSource, ContainerHandle, ContainerId, ResolvedCommand, StressSpec, STRESS_TOOL,
};
use crate::ports::{ContainerExec, ContainerSource};

/// Launch result of a detached workload. There is no handle to the running
/// process: once launched, the workload is out of our sight.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Launched { exit_code: Option<i64> },
    Failed { exit_code: Option<i64>, output: String },
}

impl DispatchOutcome {
    /// Exit code 0, or none yet because the command was detached, is a
    /// successful launch.
    fn from_exit(exit_code: Option<i64>, output: String) -> Self {
        match exit_code {
            None | Some(0) => Self::Launched { exit_code },
            Some(_) => Self::Failed { exit_code, output },
        }
    }

    pub fn is_launched(&self) -> bool {
        matches!(self, Self::Launched { .. })
    }
}

/// Per-target result of a load-injection run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetOutcome {
    Dispatched {
        handle: ContainerHandle,
        command: ResolvedCommand,
        outcome: DispatchOutcome,
    },
    Unreachable(String),
}

#[derive(Debug, Clone, Default)]
pub struct InjectionReport {
    pub results: Vec<(ContainerId, TargetOutcome)>,
}

impl InjectionReport {
    pub fn launched(&self) -> usize {
        self.results
            .iter()
            .filter(|(_, o)| matches!(o, TargetOutcome::Dispatched { outcome, .. } if outcome.is_launched()))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.results.len() - self.launched()
    }
}

/// Injects synthetic CPU/memory load into containers
pub struct LoadInjector {
    source: Arc<dyn ContainerSource>,
    exec: Arc<dyn ContainerExec>,
}

impl LoadInjector {
    pub fn new(source: Arc<dyn ContainerSource>, exec: Arc<dyn ContainerExec>) -> Self {
        Self { source, exec }
    }

    /// Process every target in order; one failing target never stops the rest
    pub async fn run(&self, spec: &StressSpec) -> InjectionReport {
        let mut report = InjectionReport::default();

        for id in spec.targets() {
            let outcome = match self.source.get_handle(id).await {
                Ok(handle) => {
                    info!("🧩 Target Container: {}", handle.label());
                    self.inject(&handle, spec).await
                }
                Err(e) => {
                    error!(container = %id, "❌ Could not access container {}: {}", id, e);
                    TargetOutcome::Unreachable(e.to_string())
                }
            };
            report.results.push((id.clone(), outcome));
        }

        info!(
            launched = report.launched(),
            failed = report.failed(),
            "✅ Stress tests launched. Monitor via `docker stats`."
        );

        report
    }

    pub async fn inject(&self, handle: &ContainerHandle, spec: &StressSpec) -> TargetOutcome {
        let capability = self.probe(handle).await;
        let command = ResolvedCommand::select(spec.mode(), spec.duration_seconds(), capability);

        match command.source {
            CommandSource::Tool => info!(container = %handle.name, "✅ {} found in {}", STRESS_TOOL, handle.name),
            CommandSource::Fallback => warn!(
                container = %handle.name,
                "⚠️ {} not found in {}, falling back to python loop (may fail if python is missing)",
                STRESS_TOOL,
                handle.name
            ),
        }

        info!(
            container = %handle.name,
            "🔥 Starting {} stress on {} for {}s...",
            spec.mode().to_string().to_uppercase(),
            handle.name,
            spec.duration_seconds()
        );
        debug!(container = %handle.name, command = %command, "Resolved command");

        let outcome = self.dispatch(handle, &command).await;

        TargetOutcome::Dispatched {
            handle: handle.clone(),
            command,
            outcome,
        }
    }

    /// Look for the load generator. Errors of any kind count as absent.
    pub async fn probe(&self, handle: &ContainerHandle) -> Capability {
        let argv = ["which".to_string(), STRESS_TOOL.to_string()];

        match self.exec.exec(handle, &argv, false).await {
            Ok(result) if result.exit_code == Some(0) => Capability::Available,
            Ok(_) => Capability::Unavailable,
            Err(e) => {
                warn!(container = %handle.name, "⚠️ Could not check {} in {}: {}", STRESS_TOOL, handle.name, e);
                Capability::Unavailable
            }
        }
    }

    /// Fire-and-forget launch of `command`
    pub async fn dispatch(&self, handle: &ContainerHandle, command: &ResolvedCommand) -> DispatchOutcome {
        let outcome = match self.exec.exec(handle, &command.argv, true).await {
            Ok(result) => DispatchOutcome::from_exit(result.exit_code, result.output),
            Err(e) => DispatchOutcome::Failed {
                exit_code: None,
                output: e.to_string(),
            },
        };

        match &outcome {
            DispatchOutcome::Launched { .. } => {
                info!(container = %handle.name, "✅ Stress command executed successfully in {}", handle.name)
            }
            DispatchOutcome::Failed { output, .. } => {
                error!(container = %handle.name, "❌ Failed to stress {}: {}", handle.name, output)
            }
        }

        outcome
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::domain::{RawStatsSample, StressMode};
    use crate::ports::{ExecError, ExecOutput, SourceError};

    struct FakeSource {
        known: Vec<ContainerHandle>,
    }

    #[async_trait]
    impl ContainerSource for FakeSource {
        async fn list_containers(&self) -> Result<Vec<ContainerHandle>, SourceError> {
            Ok(self.known.clone())
        }

        async fn get_handle(&self, id: &ContainerId) -> Result<ContainerHandle, SourceError> {
            self.known
                .iter()
                .find(|h| h.name == id.as_str())
                .cloned()
                .ok_or_else(|| SourceError::NotFound(id.clone()))
        }

        async fn fetch_stats(&self, handle: &ContainerHandle) -> Result<RawStatsSample, SourceError> {
            Err(SourceError::NoStats(handle.id.clone()))
        }
    }

    /// Per-container scripted behaviour for the probe and the launch
    #[derive(Clone, Copy)]
    enum Script {
        HasTool,
        NoTool,
        ProbeErrors,
        LaunchFails,
        LaunchErrors,
    }

    struct FakeExec {
        scripts: HashMap<String, Script>,
        calls: Mutex<Vec<(String, Vec<String>, bool)>>,
    }

    impl FakeExec {
        fn new(scripts: &[(&str, Script)]) -> Self {
            Self {
                scripts: scripts.iter().map(|(n, s)| (n.to_string(), *s)).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        async fn launches(&self) -> Vec<(String, Vec<String>)> {
            self.calls
                .lock()
                .await
                .iter()
                .filter(|(_, _, detached)| *detached)
                .map(|(name, argv, _)| (name.clone(), argv.clone()))
                .collect()
        }
    }

    #[async_trait]
    impl ContainerExec for FakeExec {
        async fn exec(
            &self,
            handle: &ContainerHandle,
            argv: &[String],
            detached: bool,
        ) -> Result<ExecOutput, ExecError> {
            self.calls
                .lock()
                .await
                .push((handle.name.clone(), argv.to_vec(), detached));

            let script = self.scripts.get(&handle.name).copied().unwrap_or(Script::NoTool);
            match (script, detached) {
                (Script::HasTool | Script::LaunchFails | Script::LaunchErrors, false) => {
                    Ok(ExecOutput::new(Some(0), "/usr/bin/stress-ng\n"))
                }
                (Script::NoTool, false) => Ok(ExecOutput::new(Some(1), "")),
                (Script::ProbeErrors, false) => Err(ExecError::Timeout(5)),
                (Script::LaunchFails, true) => Ok(ExecOutput::new(Some(127), "exec: not found")),
                (Script::LaunchErrors, true) => Err(ExecError::Timeout(5)),
                (_, true) => Ok(ExecOutput::new(None, "")),
            }
        }
    }

    fn handles(names: &[&str]) -> Vec<ContainerHandle> {
        names
            .iter()
            .map(|n| ContainerHandle::new(ContainerId::new(format!("{}0000000000000", n)), *n))
            .collect()
    }

    fn injector(names: &[&str], exec: Arc<FakeExec>) -> LoadInjector {
        LoadInjector::new(Arc::new(FakeSource { known: handles(names) }), exec)
    }

    fn spec(mode: StressMode, duration: u64, targets: &[&str]) -> StressSpec {
        StressSpec::new(mode, duration, targets.iter().map(|t| ContainerId::new(*t)).collect()).unwrap()
    }

    #[tokio::test]
    async fn test_tool_present_uses_stress_ng() {
        let exec = Arc::new(FakeExec::new(&[("web", Script::HasTool)]));
        let injector = injector(&["web"], exec.clone());

        let report = injector.run(&spec(StressMode::Both, 30, &["web"])).await;

        assert_eq!(report.launched(), 1);
        let launches = exec.launches().await;
        assert_eq!(launches.len(), 1);
        assert_eq!(
            launches[0].1.join(" "),
            "stress-ng --cpu 4 --vm 2 --vm-bytes 90% --timeout 30"
        );
    }

    #[tokio::test]
    async fn test_tool_absent_uses_fallback() {
        let exec = Arc::new(FakeExec::new(&[("db", Script::NoTool)]));
        let injector = injector(&["db"], exec.clone());

        let report = injector.run(&spec(StressMode::Memory, 30, &["db"])).await;

        match &report.results[0].1 {
            TargetOutcome::Dispatched { command, outcome, .. } => {
                assert!(command.is_fallback());
                assert!(command.argv[2].contains("while True"));
                assert!(outcome.is_launched());
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_probe_error_degrades_to_unavailable() {
        let exec = Arc::new(FakeExec::new(&[("cache", Script::ProbeErrors)]));
        let injector = injector(&["cache"], exec.clone());
        let handle = handles(&["cache"]).remove(0);

        assert_eq!(injector.probe(&handle).await, Capability::Unavailable);
    }

    #[tokio::test]
    async fn test_probe_runs_which() {
        let exec = Arc::new(FakeExec::new(&[("web", Script::HasTool)]));
        let injector = injector(&["web"], exec.clone());
        let handle = handles(&["web"]).remove(0);

        assert_eq!(injector.probe(&handle).await, Capability::Available);
        let calls = exec.calls.lock().await;
        assert_eq!(calls[0].1, vec!["which", "stress-ng"]);
        assert!(!calls[0].2);
    }

    #[tokio::test]
    async fn test_nonzero_exit_is_failure_with_output() {
        let exec = Arc::new(FakeExec::new(&[("web", Script::LaunchFails)]));
        let injector = injector(&["web"], exec.clone());

        let report = injector.run(&spec(StressMode::Cpu, 60, &["web"])).await;

        match &report.results[0].1 {
            TargetOutcome::Dispatched { outcome, .. } => assert_eq!(
                outcome,
                &DispatchOutcome::Failed {
                    exit_code: Some(127),
                    output: "exec: not found".to_string()
                }
            ),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(report.failed(), 1);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_remaining_targets() {
        let exec = Arc::new(FakeExec::new(&[
            ("a", Script::LaunchFails),
            ("c", Script::HasTool),
        ]));
        let injector = injector(&["a", "c"], exec.clone());

        let report = injector.run(&spec(StressMode::Cpu, 10, &["a", "ghost", "c"])).await;

        assert_eq!(report.results.len(), 3);
        assert!(matches!(report.results[1].1, TargetOutcome::Unreachable(_)));
        assert_eq!(report.launched(), 1);
        assert_eq!(report.failed(), 2);

        let launched: Vec<String> = exec.launches().await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(launched, vec!["a", "c"]);
    }

    #[tokio::test]
    async fn test_exec_error_on_launch_is_failure_with_error_text() {
        let exec = Arc::new(FakeExec::new(&[
            ("stuck", Script::LaunchErrors),
            ("next", Script::HasTool),
        ]));
        let injector = injector(&["stuck", "next"], exec.clone());

        let report = injector.run(&spec(StressMode::Cpu, 20, &["stuck", "next"])).await;

        match &report.results[0].1 {
            TargetOutcome::Dispatched { outcome, .. } => assert_eq!(
                outcome,
                &DispatchOutcome::Failed {
                    exit_code: None,
                    output: "exec did not finish within 5s".to_string()
                }
            ),
            other => panic!("unexpected outcome: {:?}", other),
        }
        match &report.results[1].1 {
            TargetOutcome::Dispatched { outcome, .. } => assert!(outcome.is_launched()),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert_eq!(report.launched(), 1);
        assert_eq!(report.failed(), 1);

        let launched: Vec<String> = exec.launches().await.into_iter().map(|(n, _)| n).collect();
        assert_eq!(launched, vec!["stuck", "next"]);
    }

    #[test]
    fn test_dispatch_outcome_from_exit() {
        assert!(DispatchOutcome::from_exit(None, String::new()).is_launched());
        assert!(DispatchOutcome::from_exit(Some(0), String::new()).is_launched());
        assert!(!DispatchOutcome::from_exit(Some(2), "boom".to_string()).is_launched());
    }
}

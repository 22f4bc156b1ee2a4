//! Main application orchestration and execution

use crate::{
    capability::{CapabilityDetector, CapabilityProbe, SystemCapabilityProbe},
    config::validate_config,
    error::{AppError, Result},
    logging::{console_line, LogSink, RunHeader},
    models::{RunConfig, RunSummary},
    orchestrator::Orchestrator,
    output::SummaryFormatter,
    probe::{ConnectivityProbe, HttpConnectivityProbe},
    runner::WorkerRunner,
};
use std::sync::Arc;

/// Main application struct that coordinates all components
pub struct App {
    config: Arc<RunConfig>,
}

impl App {
    /// Create a new application instance from a resolved configuration
    pub fn new(config: RunConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// Run against the real interpreter, PATH and network.
    /// Fails with a test execution error when any endpoint failed.
    pub async fn run(self) -> Result<()> {
        let capabilities = SystemCapabilityProbe::new(&self.config.runner);
        let probe = HttpConnectivityProbe::new(&self.config.runner)?;

        let summary = self.execute(capabilities, probe).await?;
        self.report(&summary)?;

        if summary.overall_success() {
            Ok(())
        } else {
            Err(AppError::test_execution(format!(
                "{} of {} attempted endpoint(s) failed",
                summary.failed_count(),
                summary.attempted()
            )))
        }
    }

    /// Detect the strategy, open the run log and process every endpoint.
    ///
    /// Capability errors surface before the log is created or any endpoint
    /// is probed.
    pub async fn execute<C, P>(&self, capabilities: C, probe: P) -> Result<RunSummary>
    where
        C: CapabilityProbe,
        P: ConnectivityProbe,
    {
        let config = &self.config;

        let warnings = validate_config(config)?;
        for warning in &warnings {
            if warning.level == crate::config::ValidationLevel::Warning || config.verbose {
                eprintln!("{}", warning.format(config.enable_color));
            }
        }

        let strategy = CapabilityDetector::new(capabilities)
            .detect(config.worker_count)
            .await?;

        if config.verbose || config.debug {
            console_line(&format!("Concurrency strategy: {} ({} worker(s))", strategy, config.worker_count));
        }

        let header = RunHeader {
            servers: config.endpoints.iter().map(|e| e.to_string()).collect(),
            worker_count: config.worker_count,
            strategy,
            runner_args: config.runner_args.clone(),
            fail_fast: config.fail_fast,
        };
        let sink = Arc::new(LogSink::create(
            &config.log_path,
            &header,
            config.mirror_to_console,
            config.enable_color,
        )?);

        if !config.json_summary {
            console_line(&format!("Logging to {}", config.log_path.display()));
        }

        let runner = WorkerRunner::new(Arc::clone(config), strategy, Arc::clone(&sink));
        let orchestrator = Orchestrator::new(Arc::clone(config), probe, runner, Arc::clone(&sink));
        orchestrator.run().await
    }

    fn report(&self, summary: &RunSummary) -> Result<()> {
        let formatter = SummaryFormatter::new(self.config.enable_color);
        if self.config.json_summary {
            console_line(&formatter.format_json(summary)?);
        } else {
            console_line("");
            console_line(&formatter.format(summary, &self.config.log_path));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_endpoints, Endpoint};
    use crate::types::Protocol;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct NoBackends;

    #[async_trait]
    impl CapabilityProbe for NoBackends {
        async fn has_native_parallel(&self) -> bool {
            false
        }

        async fn has_external_fanout(&self) -> bool {
            false
        }
    }

    struct CountingProbe {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl ConnectivityProbe for CountingProbe {
        async fn probe(&self, endpoint: &Endpoint) -> Result<Protocol> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(AppError::connectivity(format!("{} is unreachable", endpoint)))
        }
    }

    fn config(dir: &TempDir, workers: u32) -> RunConfig {
        let mut config = RunConfig::new(parse_endpoints(&["a:1", "b:2"]).unwrap(), "token");
        config.worker_count = workers;
        config.log_path = dir.path().join("run.log");
        config.enable_color = false;
        config
    }

    #[tokio::test]
    async fn test_capability_error_before_any_endpoint() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = App::new(config(&dir, 4));

        let error = app
            .execute(NoBackends, CountingProbe { calls: Arc::clone(&calls) })
            .await
            .unwrap_err();

        assert!(matches!(error, AppError::Capability(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!dir.path().join("run.log").exists());
    }

    #[tokio::test]
    async fn test_connectivity_error_aborts_after_first_probe() {
        let dir = TempDir::new().unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let app = App::new(config(&dir, 1));

        let error = app
            .execute(NoBackends, CountingProbe { calls: Arc::clone(&calls) })
            .await
            .unwrap_err();

        assert!(matches!(error, AppError::Connectivity(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let log = std::fs::read_to_string(dir.path().join("run.log")).unwrap();
        assert!(log.contains("# Strategy: sequential"));
        assert!(log.contains("FATAL: Connectivity error: a:1 is unreachable"));
        assert!(!log.contains("b:2 ("));
    }
}

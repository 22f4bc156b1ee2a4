//! Test-runner execution for one endpoint
//!
//! This module contains the pieces that turn an endpoint into a finished
//! subprocess run:
//! - Invocation building for the sequential, native-parallel and external
//!   fan-out strategies
//! - Test target discovery for external fan-out
//! - Line streaming from the subprocess into the run log
//! - Cosmetic output classification for console progress

pub mod classify;
pub mod discovery;
pub mod invocation;
pub mod stream;

pub use classify::{classify, LineKind, ProgressReporter};
pub use discovery::{discover_tests, plan_fanout, FanoutPlan};
pub use invocation::{environment_overlay, Invocation};
pub use stream::{exit_code_of, run_streaming, SPAWN_FAILURE_EXIT_CODE};

use crate::{
    error::{AppError, Result},
    logging::LogSink,
    models::{Endpoint, RunConfig},
    types::{ConcurrencyStrategy, Protocol},
};
use async_trait::async_trait;
use std::sync::Arc;

/// Exit code recorded when external fan-out finds nothing to run
pub const DISCOVERY_FAILURE_EXIT_CODE: i32 = 1;

/// Runs the suite against one endpoint and reports its exit code
#[async_trait]
pub trait EndpointRunner: Send + Sync {
    /// Execute the suite; `Err` is reserved for failures of the run log itself
    async fn run(&self, endpoint: &Endpoint, protocol: Protocol) -> Result<i32>;
}

/// Executes the test runner under the run's concurrency strategy
pub struct WorkerRunner {
    config: Arc<RunConfig>,
    strategy: ConcurrencyStrategy,
    sink: Arc<LogSink>,
}

impl WorkerRunner {
    pub fn new(config: Arc<RunConfig>, strategy: ConcurrencyStrategy, sink: Arc<LogSink>) -> Self {
        Self {
            config,
            strategy,
            sink,
        }
    }
}

#[async_trait]
impl EndpointRunner for WorkerRunner {
    async fn run(&self, endpoint: &Endpoint, protocol: Protocol) -> Result<i32> {
        let label = endpoint.label();

        let invocation = match Invocation::for_endpoint(self.strategy, &self.config, endpoint, protocol) {
            Ok(invocation) => invocation,
            Err(AppError::Discovery(message)) => {
                self.sink.write(&label, &format!("ERROR: test discovery failed: {}", message))?;
                return Ok(DISCOVERY_FAILURE_EXIT_CODE);
            }
            Err(e) => return Err(e),
        };

        self.sink.write(&label, &format!("Running: {}", invocation.command_line()))?;

        let progress = ProgressReporter::new(
            &label,
            !self.sink.mirrors_to_console(),
            self.config.enable_color,
        );
        run_streaming(&invocation, &label, &self.sink, &progress).await
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::defaults::{BASE_URL_ENV, TOKEN_ENV};
    use crate::logging::{LogLine, RunHeader};
    use std::os::unix::fs::PermissionsExt;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        config: RunConfig,
    }

    impl Fixture {
        fn new(python_body: &str) -> Self {
            let dir = TempDir::new().unwrap();
            let python = write_script(dir.path(), "fake-python", python_body);

            let mut config = RunConfig::new(vec![Endpoint::new("localhost", 8080)], "tok-123");
            config.runner.python = python.to_string_lossy().into_owned();
            config.runner.test_dir = dir.path().join("tests");
            config.log_path = dir.path().join("run.log");
            config.enable_color = false;

            Self { dir, config }
        }

        fn runner(&self, strategy: ConcurrencyStrategy) -> (WorkerRunner, Arc<LogSink>) {
            let header = RunHeader {
                servers: vec!["localhost:8080".to_string()],
                worker_count: self.config.worker_count,
                strategy,
                runner_args: self.config.runner_args.clone(),
                fail_fast: false,
            };
            let sink = Arc::new(LogSink::create(&self.config.log_path, &header, false, false).unwrap());
            let runner = WorkerRunner::new(Arc::new(self.config.clone()), strategy, Arc::clone(&sink));
            (runner, sink)
        }

        fn logged(&self, label: &str) -> Vec<String> {
            std::fs::read_to_string(&self.config.log_path)
                .unwrap()
                .lines()
                .filter_map(LogLine::parse)
                .filter(|line| line.source_label == label)
                .map(|line| line.text)
                .collect()
        }
    }

    fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    #[tokio::test]
    async fn test_exit_code_is_authoritative() {
        // Output claims success but the process exits non-zero
        let fixture = Fixture::new("echo '==== 5 passed in 0.10s ===='\nexit 3");
        let (runner, _sink) = fixture.runner(ConcurrencyStrategy::Sequential);

        let code = runner.run(&Endpoint::new("localhost", 8080), Protocol::Plain).await.unwrap();
        assert_eq!(code, 3);
        assert!(fixture.logged("localhost:8080").contains(&"==== 5 passed in 0.10s ====".to_string()));
    }

    #[tokio::test]
    async fn test_stdout_and_stderr_are_captured_in_order() {
        let fixture = Fixture::new("echo out-1\necho err-1 >&2\necho out-2\necho err-2 >&2\nexit 0");
        let (runner, _sink) = fixture.runner(ConcurrencyStrategy::Sequential);

        let code = runner.run(&Endpoint::new("localhost", 8080), Protocol::Plain).await.unwrap();
        assert_eq!(code, 0);

        let lines = fixture.logged("localhost:8080");
        let stdout: Vec<&String> = lines.iter().filter(|l| l.starts_with("out-")).collect();
        let stderr: Vec<&String> = lines.iter().filter(|l| l.starts_with("err-")).collect();
        assert_eq!(stdout, vec!["out-1", "out-2"]);
        assert_eq!(stderr, vec!["err-1", "err-2"]);
    }

    #[tokio::test]
    async fn test_default_arguments_and_environment_handoff() {
        let fixture = Fixture::new(&format!(
            "echo \"args: $*\"\necho \"token: ${}\"\necho \"base: ${}\"",
            TOKEN_ENV, BASE_URL_ENV
        ));
        let (runner, _sink) = fixture.runner(ConcurrencyStrategy::Sequential);

        runner.run(&Endpoint::new("localhost", 8080), Protocol::Plain).await.unwrap();
        runner.run(&Endpoint::new("staging", 9443), Protocol::Secure).await.unwrap();

        let first = fixture.logged("localhost:8080");
        assert!(first.contains(&"args: -m pytest -v".to_string()));
        assert!(first.contains(&"token: tok-123".to_string()));
        assert!(first.contains(&"base: http://localhost:8080".to_string()));

        let second = fixture.logged("staging:9443");
        assert!(second.contains(&"base: https://staging:9443".to_string()));
        assert!(!second.iter().any(|l| l.contains("localhost")));
    }

    #[tokio::test]
    async fn test_native_parallel_passes_worker_count() {
        let mut fixture = Fixture::new("echo \"args: $*\"");
        fixture.config.worker_count = 4;
        let (runner, _sink) = fixture.runner(ConcurrencyStrategy::NativeParallel);

        runner.run(&Endpoint::new("localhost", 8080), Protocol::Plain).await.unwrap();
        assert!(fixture.logged("localhost:8080").contains(&"args: -m pytest -n 4 -v".to_string()));
    }

    #[tokio::test]
    async fn test_external_fanout_submits_discovered_targets() {
        let mut fixture = Fixture::new("exit 0");
        let tests = fixture.dir.path().join("tests");
        std::fs::create_dir_all(&tests).unwrap();
        std::fs::write(tests.join("test_one.py"), "").unwrap();
        std::fs::write(tests.join("test_two.py"), "").unwrap();

        let fanout = write_script(fixture.dir.path(), "fake-parallel", "echo \"fanout: $*\"\nexit 1");
        fixture.config.runner.fanout_program = fanout.to_string_lossy().into_owned();
        fixture.config.worker_count = 2;
        let (runner, _sink) = fixture.runner(ConcurrencyStrategy::ExternalFanout);

        let code = runner.run(&Endpoint::new("localhost", 8080), Protocol::Plain).await.unwrap();
        assert_eq!(code, 1);

        let lines = fixture.logged("localhost:8080");
        let fanout_line = lines.iter().find(|l| l.starts_with("fanout: ")).unwrap();
        assert!(fanout_line.contains("--jobs 2 --line-buffer"));
        assert!(fanout_line.contains("test_one.py"));
        assert!(fanout_line.contains("test_two.py"));
    }

    #[tokio::test]
    async fn test_external_fanout_with_no_targets_fails_without_spawning() {
        let mut fixture = Fixture::new("exit 0");
        let marker = fixture.dir.path().join("spawned");
        let fanout = write_script(
            fixture.dir.path(),
            "fake-parallel",
            &format!("touch {}", marker.display()),
        );
        fixture.config.runner.fanout_program = fanout.to_string_lossy().into_owned();
        fixture.config.worker_count = 2;
        let (runner, _sink) = fixture.runner(ConcurrencyStrategy::ExternalFanout);

        let code = runner.run(&Endpoint::new("localhost", 8080), Protocol::Plain).await.unwrap();
        assert_eq!(code, DISCOVERY_FAILURE_EXIT_CODE);
        assert!(!marker.exists());
        assert!(fixture
            .logged("localhost:8080")
            .iter()
            .any(|l| l.contains("test discovery failed")));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_execution_failure() {
        let mut fixture = Fixture::new("exit 0");
        fixture.config.runner.python = fixture.dir.path().join("missing").to_string_lossy().into_owned();
        let (runner, _sink) = fixture.runner(ConcurrencyStrategy::Sequential);

        let code = runner.run(&Endpoint::new("localhost", 8080), Protocol::Plain).await.unwrap();
        assert_eq!(code, SPAWN_FAILURE_EXIT_CODE);
    }
}

//! Concurrency backend detection

use crate::{
    error::{AppError, Result},
    models::RunnerSettings,
    types::ConcurrencyStrategy,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const NATIVE_PROBE_TIMEOUT: Duration = Duration::from_secs(15);

/// Answers which parallel backends are installed
#[async_trait]
pub trait CapabilityProbe: Send + Sync {
    /// Whether the runtime can run tests in parallel in-process
    async fn has_native_parallel(&self) -> bool;

    /// Whether the external fan-out utility is on the execution path
    async fn has_external_fanout(&self) -> bool;
}

/// Probes the real interpreter and `PATH`
pub struct SystemCapabilityProbe {
    python: String,
    fanout_program: String,
}

impl SystemCapabilityProbe {
    pub fn new(settings: &RunnerSettings) -> Self {
        Self {
            python: settings.python.clone(),
            fanout_program: settings.fanout_program.clone(),
        }
    }
}

#[async_trait]
impl CapabilityProbe for SystemCapabilityProbe {
    async fn has_native_parallel(&self) -> bool {
        let import = format!("import {}", crate::defaults::NATIVE_PARALLEL_MODULE);
        let status = Command::new(&self.python)
            .args(["-c", &import])
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status();

        match tokio::time::timeout(NATIVE_PROBE_TIMEOUT, status).await {
            Ok(Ok(status)) => status.success(),
            _ => false,
        }
    }

    async fn has_external_fanout(&self) -> bool {
        find_on_path(&self.fanout_program).is_some()
    }
}

/// Chooses the concurrency strategy once per run
pub struct CapabilityDetector<P> {
    probe: P,
}

impl<P: CapabilityProbe> CapabilityDetector<P> {
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Pick a strategy for `worker_count` workers.
    ///
    /// A single worker never probes. More than one worker requires a backend;
    /// there is no fallback to sequential execution.
    pub async fn detect(&self, worker_count: u32) -> Result<ConcurrencyStrategy> {
        if worker_count <= 1 {
            return Ok(ConcurrencyStrategy::Sequential);
        }

        if self.probe.has_native_parallel().await {
            return Ok(ConcurrencyStrategy::NativeParallel);
        }

        if self.probe.has_external_fanout().await {
            return Ok(ConcurrencyStrategy::ExternalFanout);
        }

        Err(AppError::capability(format!(
            "{} workers requested but neither pytest-xdist nor GNU parallel is available; \
             install one of them (pip install pytest-xdist, or your package manager's 'parallel') \
             or run with --workers 1",
            worker_count
        )))
    }
}

/// Locate an executable by name on `PATH`, or check an explicit path
pub fn find_on_path(program: &str) -> Option<PathBuf> {
    let candidate = Path::new(program);
    if candidate.components().count() > 1 {
        return is_executable(candidate).then(|| candidate.to_path_buf());
    }

    let paths = std::env::var_os("PATH")?;
    std::env::split_paths(&paths)
        .map(|dir| dir.join(program))
        .find(|path| is_executable(path))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}

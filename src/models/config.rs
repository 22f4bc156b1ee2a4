//! Run configuration data model and validation

use crate::types::{AppError, Protocol, Result};
use chrono::{DateTime, Local};
use serde::{Serialize, Serializer};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// One target service instance
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    /// Create an endpoint without validation
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Base URL for the given protocol, e.g. `http://localhost:8080`
    pub fn base_url(&self, protocol: Protocol) -> String {
        format!("{}://{}:{}", protocol.scheme(), self.host, self.port)
    }

    /// Absolute URL of `path` on this endpoint
    pub fn url(&self, protocol: Protocol, path: &str) -> Result<url::Url> {
        let base = url::Url::parse(&self.base_url(protocol))?;
        Ok(base.join(path)?)
    }

    /// Label attached to log lines produced for this endpoint
    pub fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl Serialize for Endpoint {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FromStr for Endpoint {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let token = s.trim();
        if token.is_empty() {
            return Err(AppError::config("Endpoint cannot be empty"));
        }

        if token.contains("://") || token.contains('/') {
            return Err(AppError::config(format!(
                "Malformed endpoint '{}': expected host:port without scheme or path",
                token
            )));
        }

        let (host, port) = token.rsplit_once(':').ok_or_else(|| {
            AppError::config(format!("Malformed endpoint '{}': expected host:port", token))
        })?;

        if host.is_empty() {
            return Err(AppError::config(format!("Malformed endpoint '{}': missing host", token)));
        }

        // IPv6 literals must be bracketed so the port separator is unambiguous
        if host.contains(':') && !(host.starts_with('[') && host.ends_with(']')) {
            return Err(AppError::config(format!(
                "Malformed endpoint '{}': IPv6 hosts must be written as [addr]:port",
                token
            )));
        }

        let port: u16 = port.parse().map_err(|_| {
            AppError::config(format!("Malformed endpoint '{}': invalid port '{}'", token, port))
        })?;

        if port == 0 {
            return Err(AppError::config(format!("Malformed endpoint '{}': port must be 1-65535", token)));
        }

        url::Url::parse(&format!("http://{}:{}", host, port))
            .map_err(|e| AppError::config(format!("Malformed endpoint '{}': {}", token, e)))?;

        Ok(Self::new(host, port))
    }
}

/// Parse endpoint tokens, splitting comma-separated lists and keeping order.
/// Duplicates are kept.
pub fn parse_endpoints<S: AsRef<str>>(tokens: &[S]) -> Result<Vec<Endpoint>> {
    let mut endpoints = Vec::new();
    for token in tokens {
        for part in token.as_ref().split(',') {
            if part.trim().is_empty() {
                continue;
            }
            endpoints.push(part.parse()?);
        }
    }
    Ok(endpoints)
}

/// How the external test runner is located and invoked
#[derive(Debug, Clone, PartialEq)]
pub struct RunnerSettings {
    /// Interpreter used to launch pytest
    pub python: String,
    /// Directory scanned for test files by external fan-out
    pub test_dir: PathBuf,
    /// Readiness check path on every endpoint
    pub health_path: String,
    /// Overall timeout of one readiness check
    pub probe_timeout_seconds: u64,
    /// External fan-out utility
    pub fanout_program: String,
}

impl Default for RunnerSettings {
    fn default() -> Self {
        Self {
            python: crate::defaults::DEFAULT_PYTHON.to_string(),
            test_dir: PathBuf::from(crate::defaults::DEFAULT_TEST_DIR),
            health_path: crate::defaults::DEFAULT_HEALTH_PATH.to_string(),
            probe_timeout_seconds: crate::defaults::DEFAULT_PROBE_TIMEOUT.as_secs(),
            fanout_program: crate::defaults::DEFAULT_FANOUT_PROGRAM.to_string(),
        }
    }
}

impl RunnerSettings {
    /// Get probe timeout as Duration
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_seconds)
    }
}

/// Immutable configuration of one run, resolved before any endpoint is processed
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Endpoints in processing order
    pub endpoints: Vec<Endpoint>,
    /// Concurrent workers per endpoint
    pub worker_count: u32,
    /// Stop after the first failed endpoint
    pub fail_fast: bool,
    /// Echo every log line to the console
    pub mirror_to_console: bool,
    /// Run log destination
    pub log_path: PathBuf,
    /// Arguments forwarded verbatim to the test runner
    pub runner_args: Vec<String>,
    /// Token handed to the test runner
    pub auth_token: String,
    pub runner: RunnerSettings,
    pub enable_color: bool,
    pub verbose: bool,
    pub debug: bool,
    /// Print the final summary as JSON
    pub json_summary: bool,
}

impl RunConfig {
    /// Create a configuration with defaults for everything but endpoints and token
    pub fn new(endpoints: Vec<Endpoint>, auth_token: impl Into<String>) -> Self {
        Self {
            endpoints,
            worker_count: crate::defaults::DEFAULT_WORKER_COUNT,
            fail_fast: false,
            mirror_to_console: false,
            log_path: default_log_path(Local::now()),
            runner_args: Vec::new(),
            auth_token: auth_token.into(),
            runner: RunnerSettings::default(),
            enable_color: crate::defaults::DEFAULT_ENABLE_COLOR,
            verbose: false,
            debug: false,
            json_summary: false,
        }
    }

    /// Runner arguments, or the default verbose run when none were given
    pub fn effective_runner_args(&self) -> Vec<String> {
        if self.runner_args.is_empty() {
            crate::defaults::DEFAULT_RUNNER_ARGS
                .iter()
                .map(|&s| s.to_string())
                .collect()
        } else {
            self.runner_args.clone()
        }
    }

    /// Validate the configuration and return the first violation
    pub fn validate(&self) -> Result<()> {
        if self.endpoints.is_empty() {
            return Err(AppError::config("At least one endpoint is required"));
        }

        if self.worker_count == 0 {
            return Err(AppError::config("Worker count must be a positive integer"));
        }

        if self.auth_token.trim().is_empty() {
            return Err(AppError::config(format!(
                "Authentication token is required: pass --token or set {}",
                crate::defaults::TOKEN_ENV
            )));
        }

        if self.runner.python.trim().is_empty() {
            return Err(AppError::config("Python interpreter cannot be empty"));
        }

        if !self.runner.health_path.starts_with('/') {
            return Err(AppError::config(format!(
                "Health check path must start with '/': {}",
                self.runner.health_path
            )));
        }

        if self.runner.probe_timeout_seconds == 0 || self.runner.probe_timeout_seconds > 60 {
            return Err(AppError::config(format!(
                "Probe timeout must be between 1 and 60 seconds, got: {}",
                self.runner.probe_timeout_seconds
            )));
        }

        validate_log_path(&self.log_path)?;

        Ok(())
    }
}

/// Unique per-run log file name in the current directory
pub fn default_log_path(now: DateTime<Local>) -> PathBuf {
    let run_id = uuid::Uuid::new_v4().simple().to_string();
    PathBuf::from(format!(
        "test-run-{}-{}.log",
        now.format("%Y%m%d-%H%M%S"),
        &run_id[..8]
    ))
}

fn validate_log_path(path: &Path) -> Result<()> {
    if path.as_os_str().is_empty() {
        return Err(AppError::config("Log file path cannot be empty"));
    }

    if path.is_dir() {
        return Err(AppError::config(format!("Log file path is a directory: {}", path.display())));
    }

    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.is_dir() => Err(AppError::config(
            format!("Log directory does not exist: {}", parent.display()),
        )),
        _ => Ok(()),
    }
}

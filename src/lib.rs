//! Endpoint Suite Runner
//!
//! Runs an external end-to-end test suite against one or more service
//! endpoints in order. Each endpoint is probed for plain or TLS connectivity,
//! the suite is executed sequentially or in parallel depending on which
//! backend is installed, and every line of runner output is appended to a
//! single attributable run log.

pub mod app;
pub mod capability;
pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestrator;
pub mod output;
pub mod probe;
pub mod runner;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Endpoint, EndpointResult, RunConfig, RunSummary};
pub use types::{ConcurrencyStrategy, EndpointState, Protocol};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_ENDPOINTS: &[&str] = &["localhost:8080"];
    pub const DEFAULT_WORKER_COUNT: u32 = 1;
    pub const DEFAULT_PYTHON: &str = "python3";
    pub const DEFAULT_TEST_DIR: &str = "tests/e2e";
    pub const DEFAULT_HEALTH_PATH: &str = "/ping";
    pub const DEFAULT_FANOUT_PROGRAM: &str = "parallel";
    pub const DEFAULT_RUNNER_ARGS: &[&str] = &["-v"];
    pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(5);
    pub const PROBE_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    /// Environment variable carrying the API token
    pub const TOKEN_ENV: &str = "PDFDANCER_TOKEN";
    /// Environment variable carrying the negotiated base URL
    pub const BASE_URL_ENV: &str = "PDFDANCER_BASE_URL";

    /// Module name probed to detect the native parallel backend
    pub const NATIVE_PARALLEL_MODULE: &str = "xdist";
    /// Test file naming convention used by discovery
    pub const TEST_FILE_PREFIX: &str = "test_";
    pub const TEST_FILE_SUFFIX: &str = ".py";
}

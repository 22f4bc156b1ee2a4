//! Command-line interface

use clap::{ArgAction, Parser};

/// Endpoint Suite Runner - run the end-to-end test suite against one or more servers
#[derive(Parser, Debug, Clone)]
#[command(name = "esr")]
#[command(version, about, long_about = None)]
#[command(after_help = "Arguments after '--' are passed to pytest unchanged, e.g.\n  esr -s localhost:8080 -w 4 -- tests/e2e/test_page.py -x")]
pub struct Cli {
    /// Server to test as host:port (repeatable or comma-separated)
    #[arg(short, long = "server", value_name = "HOST:PORT", action = ArgAction::Append, value_delimiter = ',')]
    pub servers: Vec<String>,

    /// API token handed to the tests (falls back to PDFDANCER_TOKEN)
    #[arg(short, long)]
    pub token: Option<String>,

    /// Number of parallel test workers per server
    #[arg(short, long, default_value_t = crate::defaults::DEFAULT_WORKER_COUNT)]
    pub workers: u32,

    /// Stop at the first server whose tests fail
    #[arg(long)]
    pub fail_fast: bool,

    /// Mirror every log line to the console
    #[arg(short, long)]
    pub console: bool,

    /// Log file path (default: test-run-<timestamp>-<id>.log)
    #[arg(short, long, value_name = "PATH")]
    pub log_file: Option<String>,

    /// Python interpreter used to run pytest
    #[arg(long, env = "TEST_PYTHON", default_value = crate::defaults::DEFAULT_PYTHON)]
    pub python: String,

    /// Directory scanned for test_*.py files when distributing with GNU parallel
    #[arg(long, value_name = "DIR", default_value = crate::defaults::DEFAULT_TEST_DIR)]
    pub test_dir: String,

    /// Readiness check path on every server
    #[arg(long, value_name = "PATH", default_value = crate::defaults::DEFAULT_HEALTH_PATH)]
    pub health_path: String,

    /// Readiness check timeout in seconds
    #[arg(long, value_name = "SECS", value_parser = parse_probe_timeout, default_value_t = crate::defaults::DEFAULT_PROBE_TIMEOUT.as_secs())]
    pub probe_timeout: u64,

    /// External fan-out utility used when pytest-xdist is missing
    #[arg(long, value_name = "BIN", default_value = crate::defaults::DEFAULT_FANOUT_PROGRAM)]
    pub fanout_program: String,

    /// Print the final summary as JSON
    #[arg(long)]
    pub json: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Arguments forwarded verbatim to pytest
    #[arg(last = true, value_name = "PYTEST_ARGS")]
    pub runner_args: Vec<String>,
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }
}

/// Parse probe timeout from seconds string
fn parse_probe_timeout(s: &str) -> Result<u64, String> {
    if s.starts_with('+') {
        return Err(format!("Invalid timeout: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid timeout: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Timeout must be greater than 0".to_string())
            } else if secs > 60 {
                Err("Timeout cannot exceed 60 seconds".to_string())
            } else {
                Ok(secs)
            }
        })
}

/// Check if the terminal supports color output
fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    true
}

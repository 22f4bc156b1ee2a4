//! Per-endpoint results and the run summary

use crate::models::config::Endpoint;
use crate::types::Protocol;
use serde::Serialize;

/// Outcome of running the suite against one endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EndpointResult {
    pub endpoint: Endpoint,
    pub protocol: Protocol,
    /// Authoritative exit status of the runner
    pub exit_code: i32,
    pub duration_seconds: u64,
}

impl EndpointResult {
    pub fn new(endpoint: Endpoint, protocol: Protocol, exit_code: i32, duration_seconds: u64) -> Self {
        Self {
            endpoint,
            protocol,
            exit_code,
            duration_seconds,
        }
    }

    /// Only the exit code decides success
    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

/// Aggregated outcome of a run, built in endpoint order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub results: Vec<EndpointResult>,
    /// Failed endpoints in first-failure order, without repeats
    pub failed_endpoints: Vec<Endpoint>,
    /// Endpoints that were never attempted because of fail-fast
    pub skipped_endpoints: Vec<Endpoint>,
}

impl RunSummary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a finished endpoint
    pub fn record(&mut self, result: EndpointResult) {
        if !result.succeeded() && !self.failed_endpoints.contains(&result.endpoint) {
            self.failed_endpoints.push(result.endpoint.clone());
        }
        self.results.push(result);
    }

    /// Mark endpoints left unprocessed after a fail-fast stop
    pub fn skip(&mut self, endpoints: &[Endpoint]) {
        self.skipped_endpoints.extend_from_slice(endpoints);
    }

    /// Number of endpoints that were probed and run
    pub fn attempted(&self) -> usize {
        self.results.len()
    }

    /// Number of attempts with a non-zero exit code
    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.succeeded()).count()
    }

    pub fn overall_success(&self) -> bool {
        self.failed_endpoints.is_empty()
    }

    /// Total runner time across all attempted endpoints
    pub fn total_duration_seconds(&self) -> u64 {
        self.results.iter().map(|r| r.duration_seconds).sum()
    }

    /// JSON document with the derived fields included
    pub fn to_json(&self) -> crate::Result<String> {
        let document = serde_json::json!({
            "attempted": self.attempted(),
            "failed": self.failed_count(),
            "failed_endpoints": self.failed_endpoints,
            "skipped_endpoints": self.skipped_endpoints,
            "overall_success": self.overall_success(),
            "results": self.results,
        });
        Ok(serde_json::to_string_pretty(&document)?)
    }
}

//! Endpoint-by-endpoint run orchestration
//!
//! Endpoints are processed strictly one at a time in input order. Each one
//! moves through `Pending -> Probing -> Running -> Succeeded | Failed`. An
//! unreachable endpoint aborts the whole run; a failing test run is recorded
//! and only stops the run when fail-fast is set.

use crate::{
    error::Result,
    logging::{console_line, LogSink},
    models::{Endpoint, EndpointResult, RunConfig, RunSummary},
    probe::ConnectivityProbe,
    runner::EndpointRunner,
    types::EndpointState,
};
use colored::Colorize;
use std::sync::Arc;
use std::time::Instant;

/// Drives probing and test execution across all endpoints
pub struct Orchestrator<P, R> {
    config: Arc<RunConfig>,
    probe: P,
    runner: R,
    sink: Arc<LogSink>,
}

impl<P: ConnectivityProbe, R: EndpointRunner> Orchestrator<P, R> {
    pub fn new(config: Arc<RunConfig>, probe: P, runner: R, sink: Arc<LogSink>) -> Self {
        Self {
            config,
            probe,
            runner,
            sink,
        }
    }

    /// Process every endpoint and return the summary.
    ///
    /// Returns `Err` when an endpoint is unreachable or the run log fails;
    /// in both cases no further endpoint is touched.
    pub async fn run(&self) -> Result<RunSummary> {
        let endpoints = &self.config.endpoints;
        let mut summary = RunSummary::new();

        for (index, endpoint) in endpoints.iter().enumerate() {
            let result = self.process(index, endpoint).await?;
            let failed = !result.succeeded();
            summary.record(result);

            if failed && self.config.fail_fast {
                let remaining = &endpoints[index + 1..];
                if !remaining.is_empty() {
                    self.sink.system(&format!(
                        "Fail-fast: skipping {} remaining endpoint(s): {}",
                        remaining.len(),
                        join_endpoints(remaining)
                    ))?;
                }
                summary.skip(remaining);
                break;
            }
        }

        self.log_summary(&summary)?;
        Ok(summary)
    }

    async fn process(&self, index: usize, endpoint: &Endpoint) -> Result<EndpointResult> {
        let total = self.config.endpoints.len();
        let mut state = EndpointState::Pending;

        self.sink.system(&format!("=== START {} ({}/{}) ===", endpoint, index + 1, total))?;
        self.announce(&format!("Testing {} ({}/{})", endpoint, index + 1, total), None);

        self.transition(&mut state, EndpointState::Probing, endpoint);
        let protocol = match self.probe.probe(endpoint).await {
            Ok(protocol) => protocol,
            Err(e) => {
                self.sink.system(&format!("FATAL: {}", e))?;
                self.sink.system(&format!("=== END {} unreachable ===", endpoint))?;
                return Err(e);
            }
        };
        self.sink.system(&format!(
            "{} negotiated {} ({})",
            endpoint,
            protocol,
            endpoint.base_url(protocol)
        ))?;

        self.transition(&mut state, EndpointState::Running, endpoint);
        let started = Instant::now();
        let exit_code = self.runner.run(endpoint, protocol).await?;
        let result = EndpointResult::new(endpoint.clone(), protocol, exit_code, started.elapsed().as_secs());

        if result.succeeded() {
            self.transition(&mut state, EndpointState::Succeeded, endpoint);
        } else {
            self.transition(&mut state, EndpointState::Failed, endpoint);
            self.sink.system(&format!(
                "FAILED endpoint={} protocol={} exit_code={} duration={}s",
                result.endpoint, result.protocol, result.exit_code, result.duration_seconds
            ))?;
        }

        self.sink.system(&format!(
            "=== END {} exit_code={} duration={}s ===",
            endpoint, result.exit_code, result.duration_seconds
        ))?;
        self.announce(
            &format!("{} finished in {}s (exit code {})", endpoint, result.duration_seconds, result.exit_code),
            Some(result.succeeded()),
        );

        Ok(result)
    }

    fn transition(&self, state: &mut EndpointState, next: EndpointState, endpoint: &Endpoint) {
        if self.config.debug {
            console_line(&format!("[debug] {}: {} -> {}", endpoint, state, next));
        }
        *state = next;
    }

    /// Console progress; skipped when the log is already mirrored
    fn announce(&self, message: &str, success: Option<bool>) {
        if self.sink.mirrors_to_console() {
            return;
        }

        let line = match (self.config.enable_color, success) {
            (false, _) => message.to_string(),
            (true, None) => message.bold().to_string(),
            (true, Some(true)) => message.green().to_string(),
            (true, Some(false)) => message.red().to_string(),
        };
        console_line(&line);
    }

    fn log_summary(&self, summary: &RunSummary) -> Result<()> {
        self.sink.system(&format!(
            "Summary: attempted={} failed={} overall={}",
            summary.attempted(),
            summary.failed_count(),
            if summary.overall_success() { "SUCCESS" } else { "FAILURE" }
        ))?;

        if !summary.failed_endpoints.is_empty() {
            let mut line = format!("Failed endpoints: {}", join_endpoints(&summary.failed_endpoints));
            // Repeated endpoints fail once per attempt but are listed once
            if summary.failed_count() > summary.failed_endpoints.len() {
                line.push_str(&format!(" ({} failed attempts)", summary.failed_count()));
            }
            self.sink.system(&line)?;
        }

        if !summary.skipped_endpoints.is_empty() {
            self.sink.system(&format!("Skipped endpoints: {}", join_endpoints(&summary.skipped_endpoints)))?;
        }

        Ok(())
    }
}

fn join_endpoints(endpoints: &[Endpoint]) -> String {
    endpoints
        .iter()
        .map(Endpoint::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

//! Console rendering of the run summary
//!
//! Supports colored and plain text output, plus a JSON document for scripts.

use crate::{error::Result, models::RunSummary};
use colored::Colorize;
use std::path::Path;

/// Renders a finished run for the console
pub struct SummaryFormatter {
    use_color: bool,
}

impl SummaryFormatter {
    pub fn new(use_color: bool) -> Self {
        Self { use_color }
    }

    /// Human-readable summary block
    pub fn format(&self, summary: &RunSummary, log_path: &Path) -> String {
        let mut lines = Vec::new();
        let rule = "=".repeat(60);

        lines.push(rule.clone());
        lines.push(self.heading("Test Run Summary"));
        lines.push(rule.clone());

        for result in &summary.results {
            let status = if result.succeeded() {
                self.paint("PASS", true)
            } else {
                self.paint("FAIL", false)
            };
            lines.push(format!(
                "  {} {:<28} {:<7} exit={:<4} {}s",
                status,
                result.endpoint.to_string(),
                result.protocol.as_str(),
                result.exit_code,
                result.duration_seconds
            ));
        }

        for endpoint in &summary.skipped_endpoints {
            lines.push(format!("  {} {}", self.skipped("SKIP"), endpoint));
        }

        lines.push(String::new());
        lines.push(format!("  Endpoints attempted: {}", summary.attempted()));
        lines.push(format!("  Endpoints failed:    {}", summary.failed_count()));
        if !summary.failed_endpoints.is_empty() {
            let failed: Vec<String> = summary.failed_endpoints.iter().map(|e| e.to_string()).collect();
            lines.push(format!("  Failed:              {}", failed.join(", ")));
        }
        lines.push(format!("  Total runner time:   {}s", summary.total_duration_seconds()));
        lines.push(format!("  Log file:            {}", log_path.display()));

        let verdict = if summary.overall_success() {
            self.paint("ALL ENDPOINTS PASSED", true)
        } else {
            self.paint("TEST RUN FAILED", false)
        };
        lines.push(String::new());
        lines.push(format!("  {}", verdict));
        lines.push(rule);

        lines.join("\n")
    }

    /// Machine-readable summary
    pub fn format_json(&self, summary: &RunSummary) -> Result<String> {
        summary.to_json()
    }

    fn heading(&self, text: &str) -> String {
        if self.use_color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn paint(&self, text: &str, success: bool) -> String {
        match (self.use_color, success) {
            (false, _) => text.to_string(),
            (true, true) => text.green().bold().to_string(),
            (true, false) => text.red().bold().to_string(),
        }
    }

    fn skipped(&self, text: &str) -> String {
        if self.use_color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }
}

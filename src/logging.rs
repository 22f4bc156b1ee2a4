//! Run log shared by every worker stream
//!
//! The log is a plain-text UTF-8 file. It opens with a block of `#`-prefixed
//! metadata lines, followed by one line per event:
//!
//! ```text
//! [2026-10-19T14:03:11.482+02:00] [localhost:8080] tests/e2e/test_page.py::test_add PASSED
//! ```
//!
//! All writes go through a single lock, so concurrent writers never produce
//! partial or interleaved lines and lines from one source keep their order.

use crate::error::{AppError, Result};
use crate::types::ConcurrencyStrategy;
use chrono::{DateTime, FixedOffset, Local};
use colored::Colorize;
use std::fs::{File, OpenOptions};
use std::io::{LineWriter, Write};
use std::path::Path;
use std::sync::Mutex;

/// Reserved label for orchestrator events
pub const SYSTEM_LABEL: &str = "SYSTEM";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f%:z";

/// One attributed line of the run log
#[derive(Debug, Clone, PartialEq)]
pub struct LogLine {
    pub timestamp: DateTime<FixedOffset>,
    pub source_label: String,
    pub text: String,
}

impl LogLine {
    /// Create a line stamped with the current local time
    pub fn now(source_label: &str, text: &str) -> Self {
        Self {
            timestamp: Local::now().fixed_offset(),
            source_label: source_label.to_string(),
            text: text.to_string(),
        }
    }

    /// Render as `[timestamp] [label] text`
    pub fn render(&self) -> String {
        format!(
            "[{}] [{}] {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.source_label,
            self.text
        )
    }

    /// Parse a rendered line back; header lines and foreign text yield `None`
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.strip_prefix('[')?;
        let (timestamp, rest) = rest.split_once("] [")?;
        let timestamp = DateTime::parse_from_str(timestamp, TIMESTAMP_FORMAT).ok()?;
        let (source_label, text) = match rest.split_once("] ") {
            Some((label, text)) => (label, text),
            None => (rest.strip_suffix(']')?, ""),
        };

        Some(Self {
            timestamp,
            source_label: source_label.to_string(),
            text: text.to_string(),
        })
    }
}

/// Metadata written at the top of the log before any test output
#[derive(Debug, Clone)]
pub struct RunHeader {
    pub servers: Vec<String>,
    pub worker_count: u32,
    pub strategy: ConcurrencyStrategy,
    pub runner_args: Vec<String>,
    pub fail_fast: bool,
}

impl RunHeader {
    fn lines(&self, started_at: DateTime<Local>) -> Vec<String> {
        let runner_args = if self.runner_args.is_empty() {
            "(none)".to_string()
        } else {
            self.runner_args.join(" ")
        };

        vec![
            format!("# {} v{} test run", crate::PKG_NAME, crate::VERSION),
            format!("# Started: {}", started_at.format(TIMESTAMP_FORMAT)),
            format!("# Servers: {}", self.servers.join(", ")),
            format!("# Workers: {}", self.worker_count),
            format!("# Strategy: {}", self.strategy),
            format!("# Runner arguments: {}", runner_args),
            format!("# Fail-fast: {}", self.fail_fast),
            "#".to_string(),
        ]
    }
}

/// Print one line to the console. A closed stdout (`esr --console | head`)
/// must not end the run, so write errors are dropped.
pub fn console_line(text: &str) {
    let _ = write_console(&mut std::io::stdout().lock(), text);
}

fn write_console<W: Write>(out: &mut W, text: &str) -> std::io::Result<()> {
    writeln!(out, "{}", text)?;
    out.flush()
}

/// Append-only, serialized destination for every log line of a run
pub struct LogSink {
    writer: Mutex<LineWriter<File>>,
    mirror_to_console: bool,
    use_color: bool,
}

impl LogSink {
    /// Create or truncate the log file and write the header block
    pub fn create(path: &Path, header: &RunHeader, mirror_to_console: bool, use_color: bool) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| AppError::io(format!("Cannot open log file {}: {}", path.display(), e)))?;

        let mut writer = LineWriter::new(file);
        for line in header.lines(Local::now()) {
            writeln!(writer, "{}", line)?;
        }
        writer.flush()?;

        Ok(Self {
            writer: Mutex::new(writer),
            mirror_to_console,
            use_color,
        })
    }

    /// Whether every line is echoed to the console
    pub fn mirrors_to_console(&self) -> bool {
        self.mirror_to_console
    }

    /// Append one line attributed to `source_label`. Multi-line text is split
    /// into one log line per text line.
    pub fn write(&self, source_label: &str, text: &str) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| AppError::internal("Run log lock poisoned"))?;

        for text_line in text.trim_end_matches(['\r', '\n']).split('\n') {
            let line = LogLine::now(source_label, text_line.trim_end_matches('\r'));
            writer.write_all(format!("{}\n", line.render()).as_bytes())?;

            if self.mirror_to_console {
                console_line(&self.console_form(&line));
            }
        }

        Ok(())
    }

    /// Append an orchestrator event
    pub fn system(&self, text: &str) -> Result<()> {
        self.write(SYSTEM_LABEL, text)
    }

    fn console_form(&self, line: &LogLine) -> String {
        let label = format!("[{}]", line.source_label);
        if !self.use_color {
            return format!("{} {}", label, line.text);
        }

        let label = if line.source_label == SYSTEM_LABEL {
            label.yellow().bold()
        } else {
            label.cyan()
        };
        format!("{} {}", label, line.text)
    }
}

//! Cosmetic classification of runner output
//!
//! Recognizes a handful of pytest landmarks so the console can show a
//! condensed progress view. Nothing here feeds into exit codes or log content.

use colored::Colorize;
use regex::Regex;
use std::sync::OnceLock;

/// What a single line of runner output looks like
#[derive(Debug, Clone, PartialEq)]
pub enum LineKind {
    /// `collected N items`, or xdist's `N workers [M items]`
    Collected(u64),
    /// `==== test session starts ====`
    SessionStart,
    /// `==== FAILURES ====` or `==== ERRORS ====`
    FailureSection,
    /// Final counts, e.g. `3 passed, 1 failed in 2.31s`
    Summary(String),
    Other,
}

struct Patterns {
    collected: Regex,
    workers: Regex,
    session: Regex,
    failures: Regex,
    summary: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        collected: Regex::new(r"^collected (\d+) items?").expect("valid regex"),
        workers: Regex::new(r"^\d+ workers? \[(\d+) items?\]").expect("valid regex"),
        session: Regex::new(r"^=+ test session starts =+$").expect("valid regex"),
        failures: Regex::new(r"^=+ (FAILURES|ERRORS) =+$").expect("valid regex"),
        summary: Regex::new(
            r"^=+ (.*\b(?:passed|failed|errors?|skipped|xfailed|xpassed|no tests ran)\b.* in [0-9.]+s\b.*?) =+$",
        )
        .expect("valid regex"),
    })
}

/// Classify one line of runner output
pub fn classify(line: &str) -> LineKind {
    let line = line.trim();
    let patterns = patterns();

    if let Some(caps) = patterns
        .collected
        .captures(line)
        .or_else(|| patterns.workers.captures(line))
    {
        if let Ok(count) = caps[1].parse() {
            return LineKind::Collected(count);
        }
    }

    if patterns.session.is_match(line) {
        return LineKind::SessionStart;
    }

    if patterns.failures.is_match(line) {
        return LineKind::FailureSection;
    }

    if let Some(caps) = patterns.summary.captures(line) {
        return LineKind::Summary(caps[1].to_string());
    }

    LineKind::Other
}

/// Prints a condensed progress line for recognized output
pub struct ProgressReporter {
    label: String,
    enabled: bool,
    use_color: bool,
}

impl ProgressReporter {
    pub fn new(label: &str, enabled: bool, use_color: bool) -> Self {
        Self {
            label: label.to_string(),
            enabled,
            use_color,
        }
    }

    /// Observe a line; prints when enabled and the line is a landmark
    pub fn observe(&self, line: &str) -> LineKind {
        let kind = classify(line);
        if self.enabled {
            if let Some(progress) = self.render(&kind) {
                crate::logging::console_line(&progress);
            }
        }
        kind
    }

    fn render(&self, kind: &LineKind) -> Option<String> {
        let (text, failing) = match kind {
            LineKind::SessionStart => ("test session started".to_string(), false),
            LineKind::Collected(count) => (format!("collected {} tests", count), false),
            LineKind::FailureSection => ("failures reported".to_string(), true),
            LineKind::Summary(summary) => {
                let failing = summary.contains("failed") || summary.contains("error");
                (summary.clone(), failing)
            }
            LineKind::Other => return None,
        };

        let label = format!("  [{}]", self.label);
        if !self.use_color {
            return Some(format!("{} {}", label, text));
        }

        let text = if failing { text.red() } else { text.green() };
        Some(format!("{} {}", label.dimmed(), text))
    }
}

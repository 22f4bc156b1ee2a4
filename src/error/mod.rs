//! Error handling for the endpoint suite runner

use thiserror::Error;

/// Error taxonomy for a test run
#[derive(Error, Debug)]
pub enum AppError {
    /// Bad flag value, missing token, malformed endpoint, invalid worker count
    #[error("Configuration error: {0}")]
    Config(String),

    /// Concurrency requested but no parallel backend is available
    #[error("Capability error: {0}")]
    Capability(String),

    /// Endpoint unreachable on both protocols
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    /// Test runner reported a non-zero exit status
    #[error("Test execution error: {0}")]
    TestExecution(String),

    /// External fan-out found no test targets
    #[error("Test discovery error: {0}")]
    Discovery(String),

    /// I/O errors (log file, process pipes, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (endpoints, numbers, JSON)
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new capability error
    pub fn capability<S: Into<String>>(message: S) -> Self {
        Self::Capability(message.into())
    }

    /// Create a new connectivity error
    pub fn connectivity<S: Into<String>>(message: S) -> Self {
        Self::Connectivity(message.into())
    }

    /// Create a new test execution error
    pub fn test_execution<S: Into<String>>(message: S) -> Self {
        Self::TestExecution(message.into())
    }

    /// Create a new discovery error
    pub fn discovery<S: Into<String>>(message: S) -> Self {
        Self::Discovery(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Create a new internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Capability(_) => "CAPABILITY",
            Self::Connectivity(_) => "CONNECTIVITY",
            Self::TestExecution(_) => "TEST",
            Self::Discovery(_) => "DISCOVERY",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check your command line arguments, environment variables or .env file.", msg)
            }
            Self::Capability(msg) => {
                format!("No parallel backend available: {}\n\nSuggestion: Install pytest-xdist (pip install pytest-xdist) or GNU parallel, or run with --workers 1.", msg)
            }
            Self::Connectivity(msg) => {
                format!("Server unreachable: {}\n\nSuggestion: Make sure the server is running and its readiness endpoint answers over http or https.", msg)
            }
            Self::TestExecution(msg) => {
                format!("Test execution failed: {}\n\nSuggestion: Inspect the run log for the failing endpoint's output.", msg)
            }
            Self::Discovery(msg) => {
                format!("No tests found: {}\n\nSuggestion: Check --test-dir or pass explicit test files after '--'.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and disk space.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse input: {}\n\nSuggestion: Check the format of the value you supplied.", msg)
            }
            Self::Internal(msg) => {
                format!("Internal error: {}\n\nThis is likely a bug. Please report this issue with the error details.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::TestExecution(_) | Self::Discovery(_) => 1,
            Self::Config(_) | Self::Parse(_) => 2,
            Self::Capability(_) => 3,
            Self::Connectivity(_) => 4,
            Self::Io(_) => 5,
            Self::Internal(_) => 99,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Capability(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Connectivity(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::TestExecution(_) | Self::Discovery(_) | Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
                Self::Internal(_) => {
                    format!("[{}] {}", category.bright_red().bold(), message.bright_red())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        Self::io(error.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(error: url::ParseError) -> Self {
        Self::parse(format!("URL parse error: {}", error))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        Self::parse(format!("JSON error: {}", error))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_builder() {
            Self::internal(format!("Failed to build HTTP client: {}", error))
        } else {
            Self::connectivity(error.to_string())
        }
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Error reporter for user feedback on stderr
pub struct ErrorReporter {
    pub use_color: bool,
    pub verbose: bool,
}

impl ErrorReporter {
    /// Create a new error reporter
    pub fn new(use_color: bool, verbose: bool) -> Self {
        Self { use_color, verbose }
    }

    /// Report an error to the user
    pub fn report_error(&self, error: &AppError) {
        eprintln!("{}", error.format_for_console(self.use_color));

        if self.verbose {
            eprintln!();
            eprintln!("{}", error.user_friendly_message());
        }
    }
}

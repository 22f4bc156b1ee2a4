//! Advisory configuration checks

use crate::{error::Result, models::RunConfig};
use std::collections::HashSet;

/// Configuration validator producing non-fatal warnings
pub struct ConfigValidator;

impl ConfigValidator {
    /// Run hard validation, then collect warnings
    pub fn validate_comprehensive(config: &RunConfig) -> Result<Vec<ValidationWarning>> {
        config.validate()?;

        let mut warnings = Vec::new();
        warnings.extend(Self::check_duplicate_endpoints(config));
        warnings.extend(Self::check_worker_count(config, num_cpus::get()));
        warnings.extend(Self::check_runner_args(config));
        Ok(warnings)
    }

    fn check_duplicate_endpoints(config: &RunConfig) -> Vec<ValidationWarning> {
        let mut seen = HashSet::new();
        let mut reported = HashSet::new();
        let mut warnings = Vec::new();

        for endpoint in &config.endpoints {
            if !seen.insert(endpoint) && reported.insert(endpoint) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Endpoint {} is listed more than once and will be tested each time", endpoint),
                ));
            }
        }

        warnings
    }

    fn check_worker_count(config: &RunConfig, cpus: usize) -> Vec<ValidationWarning> {
        if config.worker_count as usize > cpus {
            vec![ValidationWarning::new(
                ValidationLevel::Warning,
                format!(
                    "{} workers requested but only {} CPUs are available",
                    config.worker_count, cpus
                ),
            )]
        } else {
            Vec::new()
        }
    }

    fn check_runner_args(config: &RunConfig) -> Vec<ValidationWarning> {
        let sets_workers = config
            .runner_args
            .iter()
            .any(|arg| arg == "-n" || arg.starts_with("--numprocesses") || (arg.starts_with("-n") && arg[2..].parse::<u32>().is_ok()));

        if sets_workers && config.worker_count > 1 {
            vec![ValidationWarning::new(
                ValidationLevel::Warning,
                "Runner arguments set their own worker count; use --workers instead".to_string(),
            )]
        } else {
            Vec::new()
        }
    }
}

/// Validation warning levels
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

impl ValidationLevel {
    /// Get display string for level
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
        }
    }
}

/// Non-fatal configuration finding
#[derive(Debug, Clone)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }

    /// Format warning for display
    pub fn format(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            let tag = match self.level {
                ValidationLevel::Info => self.level.as_str().blue(),
                ValidationLevel::Warning => self.level.as_str().yellow(),
            };
            format!("[{}] {}", tag, self.message)
        } else {
            format!("[{}] {}", self.level.as_str(), self.message)
        }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &RunConfig) -> Result<Vec<ValidationWarning>> {
    ConfigValidator::validate_comprehensive(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{parse_endpoints, Endpoint};

    fn config(endpoints: &[&str]) -> RunConfig {
        RunConfig::new(parse_endpoints(endpoints).unwrap(), "token")
    }

    #[test]
    fn test_clean_config_has_no_warnings() {
        let warnings = validate_config(&config(&["localhost:8080"])).unwrap();
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_invalid_config_is_error() {
        let mut config = config(&["localhost:8080"]);
        config.worker_count = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_duplicate_endpoint_reported_once() {
        let warnings = ConfigValidator::check_duplicate_endpoints(&config(&["a:1", "a:1", "b:2", "a:1"]));
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("a:1"));
        assert_eq!(warnings[0].level, ValidationLevel::Info);
    }

    #[test]
    fn test_worker_oversubscription() {
        let mut config = RunConfig::new(vec![Endpoint::new("a", 1)], "token");
        config.worker_count = 16;
        assert_eq!(ConfigValidator::check_worker_count(&config, 4).len(), 1);
        assert!(ConfigValidator::check_worker_count(&config, 16).is_empty());
    }

    #[test]
    fn test_conflicting_worker_arguments() {
        let mut config = config(&["a:1"]);
        config.worker_count = 4;
        config.runner_args = vec!["-n8".to_string()];
        assert_eq!(ConfigValidator::check_runner_args(&config).len(), 1);

        config.runner_args = vec!["-x".to_string(), "--no-header".to_string()];
        assert!(ConfigValidator::check_runner_args(&config).is_empty());
    }

    #[test]
    fn test_plain_format() {
        let warning = ValidationWarning::new(ValidationLevel::Warning, "careful".to_string());
        assert_eq!(warning.format(false), "[WARNING] careful");
    }
}

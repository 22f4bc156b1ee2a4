//! Configuration parsing from CLI arguments and environment variables

use crate::{
    cli::Cli,
    config::env::EnvManager,
    error::{AppError, Result},
    models::{config::default_log_path, parse_endpoints, RunConfig, RunnerSettings},
};
use chrono::Local;
use std::path::PathBuf;

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    pub fn parse(&self) -> Result<RunConfig> {
        EnvManager::load_env_file(self.cli.debug)?;

        let config = self.build(EnvManager::var(crate::defaults::TOKEN_ENV))?;
        config.validate()?;

        Ok(config)
    }

    /// Build a configuration from the CLI and an environment-supplied token
    pub fn build(&self, env_token: Option<String>) -> Result<RunConfig> {
        let endpoints = if self.cli.servers.is_empty() {
            parse_endpoints(crate::defaults::DEFAULT_ENDPOINTS)?
        } else {
            parse_endpoints(&self.cli.servers)?
        };

        let auth_token = resolve_token(self.cli.token.as_deref(), env_token).ok_or_else(|| {
            AppError::config(format!(
                "No authentication token: pass --token or set {}",
                crate::defaults::TOKEN_ENV
            ))
        })?;

        let log_path = match &self.cli.log_file {
            Some(path) => PathBuf::from(path),
            None => default_log_path(Local::now()),
        };

        let config = RunConfig {
            endpoints,
            worker_count: self.cli.workers,
            fail_fast: self.cli.fail_fast,
            mirror_to_console: self.cli.console,
            log_path,
            runner_args: self.cli.runner_args.clone(),
            auth_token,
            runner: RunnerSettings {
                python: self.cli.python.clone(),
                test_dir: PathBuf::from(&self.cli.test_dir),
                health_path: self.cli.health_path.clone(),
                probe_timeout_seconds: self.cli.probe_timeout,
                fanout_program: self.cli.fanout_program.clone(),
            },
            enable_color: self.cli.use_colors(),
            verbose: self.cli.verbose,
            debug: self.cli.debug,
            json_summary: self.cli.json,
        };

        if config.debug {
            println!("Resolved configuration:");
            println!("{}", display_config_summary(&config));
        }

        Ok(config)
    }
}

/// CLI token wins; otherwise the environment; blank values count as missing
pub fn resolve_token(cli_token: Option<&str>, env_token: Option<String>) -> Option<String> {
    cli_token
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .or_else(|| env_token.filter(|token| !token.trim().is_empty()))
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<RunConfig> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary; the token is masked
pub fn display_config_summary(config: &RunConfig) -> String {
    let servers: Vec<String> = config.endpoints.iter().map(|e| e.to_string()).collect();
    let mut summary = Vec::new();

    summary.push(format!("  Servers: {}", servers.join(", ")));
    summary.push(format!("  Workers: {}", config.worker_count));
    summary.push(format!("  Fail-fast: {}", config.fail_fast));
    summary.push(format!("  Console mirror: {}", config.mirror_to_console));
    summary.push(format!("  Log file: {}", config.log_path.display()));
    summary.push(format!("  Token: {}", mask_token(&config.auth_token)));
    summary.push(format!("  Python: {}", config.runner.python));
    summary.push(format!("  Test directory: {}", config.runner.test_dir.display()));
    summary.push(format!("  Health path: {}", config.runner.health_path));
    summary.push(format!("  Probe timeout: {}s", config.runner.probe_timeout_seconds));
    summary.push(format!("  Runner arguments: {}", config.runner_args.join(" ")));

    summary.join("\n")
}

fn mask_token(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        "****".to_string()
    } else {
        format!("{}****", visible)
    }
}

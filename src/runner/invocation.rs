//! Subprocess invocations for each concurrency strategy

use crate::{
    defaults::{BASE_URL_ENV, TOKEN_ENV},
    error::Result,
    models::{Endpoint, RunConfig},
    runner::discovery::plan_fanout,
    types::{ConcurrencyStrategy, Protocol},
};

/// A fully resolved subprocess call
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Variables overlaid on the inherited environment for this call only
    pub env: Vec<(String, String)>,
}

impl Invocation {
    /// Build the invocation for one endpoint under `strategy`.
    ///
    /// Fails with a discovery error when external fan-out has no targets.
    pub fn for_endpoint(
        strategy: ConcurrencyStrategy,
        config: &RunConfig,
        endpoint: &Endpoint,
        protocol: Protocol,
    ) -> Result<Self> {
        let python = config.runner.python.clone();
        let mut args = vec!["-m".to_string(), "pytest".to_string()];

        let program = match strategy {
            ConcurrencyStrategy::Sequential => {
                args.extend(config.effective_runner_args());
                python
            }
            ConcurrencyStrategy::NativeParallel => {
                args.push("-n".to_string());
                args.push(config.worker_count.to_string());
                args.extend(config.effective_runner_args());
                python
            }
            ConcurrencyStrategy::ExternalFanout => {
                let plan = plan_fanout(config)?;
                let mut fanout_args = vec![
                    "--jobs".to_string(),
                    config.worker_count.to_string(),
                    "--line-buffer".to_string(),
                    "--quote".to_string(),
                    python,
                ];
                fanout_args.append(&mut args);
                fanout_args.extend(plan.options);
                fanout_args.push(":::".to_string());
                fanout_args.extend(plan.targets);
                args = fanout_args;
                config.runner.fanout_program.clone()
            }
        };

        Ok(Self {
            program,
            args,
            env: environment_overlay(config, endpoint, protocol),
        })
    }

    /// Printable command line; the environment overlay is left out
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Token and base URL of the endpoint under test
pub fn environment_overlay(config: &RunConfig, endpoint: &Endpoint, protocol: Protocol) -> Vec<(String, String)> {
    vec![
        (TOKEN_ENV.to_string(), config.auth_token.clone()),
        (BASE_URL_ENV.to_string(), endpoint.base_url(protocol)),
    ]
}

//! Data models for endpoints, run configuration and results

pub mod config;
pub mod results;

// Re-export main model types
pub use config::{Endpoint, RunConfig, RunnerSettings, parse_endpoints};
pub use results::{EndpointResult, RunSummary};

//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Wire protocol negotiated with an endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Protocol {
    /// Plain HTTP
    Plain,
    /// HTTP over TLS
    Secure,
}

impl Protocol {
    /// Probe order: plain first, secure as fallback
    pub const PROBE_ORDER: [Protocol; 2] = [Protocol::Plain, Protocol::Secure];

    /// URL scheme for this protocol
    pub fn scheme(&self) -> &'static str {
        match self {
            Protocol::Plain => "http",
            Protocol::Secure => "https",
        }
    }

    /// Tag used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Plain => "PLAIN",
            Protocol::Secure => "SECURE",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How test execution is parallelised within one endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConcurrencyStrategy {
    /// One runner process, no workers
    Sequential,
    /// One runner process using its own parallel backend
    NativeParallel,
    /// One runner process per test target, distributed by an external utility
    ExternalFanout,
}

impl ConcurrencyStrategy {
    /// Human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            ConcurrencyStrategy::Sequential => "sequential",
            ConcurrencyStrategy::NativeParallel => "native-parallel (pytest-xdist)",
            ConcurrencyStrategy::ExternalFanout => "external-fanout (GNU parallel)",
        }
    }
}

impl fmt::Display for ConcurrencyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Processing state of a single endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointState {
    Pending,
    Probing,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for EndpointState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EndpointState::Pending => "PENDING",
            EndpointState::Probing => "PROBING",
            EndpointState::Running => "RUNNING",
            EndpointState::Succeeded => "SUCCEEDED",
            EndpointState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

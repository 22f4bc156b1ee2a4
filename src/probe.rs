//! Endpoint readiness probing and protocol negotiation

use crate::{
    error::{AppError, Result},
    models::{Endpoint, RunnerSettings},
    types::Protocol,
};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Determines whether an endpoint is reachable and which protocol it speaks
#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    /// Return the negotiated protocol, or a connectivity error naming the endpoint
    async fn probe(&self, endpoint: &Endpoint) -> Result<Protocol>;
}

/// Probe that issues `GET <health_path>` over plain HTTP, then HTTPS
pub struct HttpConnectivityProbe {
    client: Client,
    health_path: String,
}

impl HttpConnectivityProbe {
    /// Create a probe from runner settings
    pub fn new(settings: &RunnerSettings) -> Result<Self> {
        Self::with_timeout(&settings.health_path, settings.probe_timeout())
    }

    /// Create a probe with an explicit overall timeout
    pub fn with_timeout(health_path: &str, timeout: Duration) -> Result<Self> {
        let connect_timeout = crate::defaults::PROBE_CONNECT_TIMEOUT.min(timeout);

        // Local servers commonly present self-signed certificates
        let client = Client::builder()
            .connect_timeout(connect_timeout)
            .timeout(timeout)
            .danger_accept_invalid_certs(true)
            .no_proxy()
            .user_agent(format!("{}/{}", crate::PKG_NAME, crate::VERSION))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            health_path: health_path.to_string(),
        })
    }

    async fn check(&self, endpoint: &Endpoint, protocol: Protocol) -> std::result::Result<(), String> {
        let url = endpoint
            .url(protocol, &self.health_path)
            .map_err(|e| e.to_string())?;

        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                "timed out".to_string()
            } else if e.is_connect() {
                "connection failed".to_string()
            } else {
                e.to_string()
            }
        })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(format!("HTTP {}", status.as_u16()))
        }
    }
}

#[async_trait]
impl ConnectivityProbe for HttpConnectivityProbe {
    async fn probe(&self, endpoint: &Endpoint) -> Result<Protocol> {
        let mut failures = Vec::new();

        for protocol in Protocol::PROBE_ORDER {
            match self.check(endpoint, protocol).await {
                Ok(()) => return Ok(protocol),
                Err(reason) => failures.push(format!("{}: {}", protocol.scheme(), reason)),
            }
        }

        Err(AppError::connectivity(format!(
            "{} is unreachable ({})",
            endpoint,
            failures.join("; ")
        )))
    }
}

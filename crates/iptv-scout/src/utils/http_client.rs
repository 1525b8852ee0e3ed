//! HTTP client construction
//!
//! Portals frequently serve self-signed certificates, so every client built
//! here skips certificate verification.

use reqwest::Client;
use std::time::Duration;

use crate::errors::AppResult;

/// Builds reqwest clients with the shared user agent and TLS settings
#[derive(Clone, Debug)]
pub struct HttpClientFactory {
    user_agent: String,
}

impl Default for HttpClientFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClientFactory {
    pub fn new() -> Self {
        Self {
            user_agent: format!("{}/{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        }
    }

    /// Client whose connect phase and whole request share one timeout
    pub fn with_timeout(&self, timeout: Duration) -> AppResult<Client> {
        self.build(timeout, Some(timeout))
    }

    /// Client with a connect timeout only; the caller bounds the total time
    pub fn with_connect_timeout(&self, connect_timeout: Duration) -> AppResult<Client> {
        self.build(connect_timeout, None)
    }

    fn build(&self, connect_timeout: Duration, timeout: Option<Duration>) -> AppResult<Client> {
        let mut builder = Client::builder()
            .user_agent(&self.user_agent)
            .connect_timeout(connect_timeout)
            .danger_accept_invalid_certs(true);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build()?)
    }
}

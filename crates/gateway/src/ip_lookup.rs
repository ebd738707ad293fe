//! Public IP lookup for the consent audit trail.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use intake_core::legal::{IpLookup, UNKNOWN_IP};

pub const DEFAULT_IP_LOOKUP_URL: &str = "https://api.ipify.org?format=json";

pub const DEFAULT_IP_LOOKUP_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Deserialize)]
struct IpResponse {
    ip: String,
}

/// Queries an endpoint answering `{ "ip": "..." }`.
#[derive(Debug, Clone)]
pub struct HttpIpLookup {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpIpLookup {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout: DEFAULT_IP_LOOKUP_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn fetch(&self) -> Result<String, reqwest::Error> {
        let body: IpResponse = self
            .client
            .get(&self.url)
            .timeout(self.timeout)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(body.ip)
    }
}

impl Default for HttpIpLookup {
    fn default() -> Self {
        Self::new(DEFAULT_IP_LOOKUP_URL)
    }
}

#[async_trait]
impl IpLookup for HttpIpLookup {
    async fn public_ip(&self) -> String {
        match self.fetch().await {
            Ok(ip) if !ip.trim().is_empty() => ip.trim().to_string(),
            Ok(_) => UNKNOWN_IP.to_string(),
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "IP lookup failed");
                UNKNOWN_IP.to_string()
            }
        }
    }
}

//! Registry HTTP API client
//!
//! Thin reqwest wrapper over the three endpoints the operator tools probe.

use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::config::constants::{HEALTH_PATH, LIST_PATH, PING_PATH};
use crate::domain::health::{check_health_body, check_list_body, check_ping_body, ListPayload, ProbeOutcome};
use crate::error::OpsResult;

/// Per-request timeout for probes
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Client for the registry API
#[derive(Clone)]
pub struct RegistryApi {
    base_url: String,
    http: Client,
}

/// Raw HTTP response of a probe
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub body: String,
}

impl RegistryApi {
    pub fn new(base_url: impl Into<String>) -> OpsResult<Self> {
        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .connect_timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// GET `path`; any HTTP status counts as a response, only transport failures are errors
    pub async fn get(&self, path: &str) -> Result<RawResponse, reqwest::Error> {
        let url = self.url(path);
        debug!(url = %url, "GET");
        let response = self.http.get(&url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        Ok(RawResponse { status, body })
    }

    /// Liveness probe used by the readiness loop
    pub async fn ping(&self) -> Result<RawResponse, reqwest::Error> {
        self.get(PING_PATH).await
    }

    /// Liveness endpoint returns the literal token
    pub async fn check_ping(&self) -> ProbeOutcome {
        match self.ping().await {
            Ok(resp) => check_ping_body(&resp.body),
            Err(e) => ProbeOutcome::Fail(format!("unreachable: {}", e)),
        }
    }

    /// Health endpoint reports `status: ok`
    pub async fn check_health(&self) -> ProbeOutcome {
        match self.get(HEALTH_PATH).await {
            Ok(resp) => match check_health_body(&resp.body) {
                ProbeOutcome::Fail(reason) if !resp.status.is_success() => {
                    ProbeOutcome::Fail(format!("HTTP {}: {}", resp.status.as_u16(), reason))
                }
                outcome => outcome,
            },
            Err(e) => ProbeOutcome::Fail(format!("unreachable: {}", e)),
        }
    }

    /// Listing endpoint returns a non-empty count
    pub async fn check_list(&self) -> ProbeOutcome {
        match self.get(LIST_PATH).await {
            Ok(resp) => check_list_body(&resp.body),
            Err(e) => ProbeOutcome::Fail(format!("unreachable: {}", e)),
        }
    }

    /// Record count from the listing endpoint
    pub async fn record_count(&self) -> OpsResult<u64> {
        let payload: ListPayload = self
            .http
            .get(self.url(LIST_PATH))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(payload.count)
    }
}

//! HTTP client for the external secret-inspection service.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;

use super::{Finding, InfoType, SecretInspector, INFO_TYPE_CATALOGUE};

/// Hard ceiling on a single inspection call; expiry surfaces as a normal
/// check failure, never a hang.
const INSPECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct InspectRequest<'a> {
    item: &'a str,
    info_types: &'a [InfoType],
}

#[derive(Deserialize)]
struct InspectResponse {
    #[serde(default)]
    findings: Vec<Finding>,
}

/// Inspector backed by the remote inspection service's HTTP API
pub struct HttpInspector {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpInspector {
    /// Create a client for the service at `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(INSPECT_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/v1/inspect", base_url.trim_end_matches('/')),
        })
    }
}

#[async_trait]
impl SecretInspector for HttpInspector {
    async fn inspect(&self, text: &str) -> Result<Vec<Finding>> {
        let request = InspectRequest {
            item: text,
            info_types: &INFO_TYPE_CATALOGUE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?
            .error_for_status()?;

        let body: InspectResponse = response.json().await?;
        debug!(findings = body.findings.len(), "inspection completed");
        Ok(body.findings)
    }
}

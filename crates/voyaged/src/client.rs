use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, error, warn};
use voyage_core::generation::{GenerationRequest, GenerationResponse, GenerationService};
use voyage_core::UpstreamError;

/// Probe budget for the health endpoint.
const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
/// Longest slice of an upstream body written to the log.
const LOG_BODY_CHARS: usize = 500;

/// Generation service reached over HTTP (`POST {endpoint}/generate_structured`).
#[derive(Clone, Debug)]
pub struct HttpGenerationService {
    client: Client,
    endpoint: String,
    timeout: Duration,
}

impl HttpGenerationService {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build generation http client")?;
        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            timeout,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.endpoint, path)
    }

    fn transport_error(&self, err: reqwest::Error) -> UpstreamError {
        if err.is_timeout() {
            UpstreamError::Timeout(self.timeout)
        } else {
            UpstreamError::Transport(err.to_string())
        }
    }
}

#[async_trait]
impl GenerationService for HttpGenerationService {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResponse, UpstreamError> {
        let url = self.url("/generate_structured");
        debug!(%url, fields = request.context.len(), "sending generation request");

        let response = self
            .client
            .post(&url)
            .json(request)
            .send()
            .await
            .map_err(|err| self.transport_error(err))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.transport_error(err))?;

        if !status.is_success() {
            error!(status = status.as_u16(), body = %clip(&body), "generation service error");
            return Err(UpstreamError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }
        debug!(raw = %clip(&body), "generation response");
        serde_json::from_str(&body).map_err(|err| {
            error!(%err, body = %clip(&body), "failed to parse generation response");
            UpstreamError::Decode(err.to_string())
        })
    }

    async fn health(&self) -> bool {
        match self
            .client
            .get(self.url("/health"))
            .timeout(HEALTH_TIMEOUT)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(err) => {
                warn!(%err, "generation service health check failed");
                false
            }
        }
    }
}

fn clip(body: &str) -> String {
    body.chars().take(LOG_BODY_CHARS).collect()
}

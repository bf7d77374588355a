use async_trait::async_trait;
use reqwest::{
    header::{HeaderValue, ACCEPT},
    Client, StatusCode,
};
use std::time::Duration;
use url::Url;

use super::provider::ScoringBackend;
use crate::config::ScoringConfig;
use crate::error::{Result, ValorizeError};
use crate::models::{ScoringRequest, ScoringResponse};

const ANALYSIS_PATH: &str = "get_analysis";
const HEALTH_PATH: &str = "health";

/// HTTP client for the novelty scoring service.
#[derive(Clone)]
pub struct ScoringApiClient {
    client: Client,
    config: ScoringConfig,
}

impl ScoringApiClient {
    pub fn new(config: ScoringConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ValorizeError::Transport(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        let base = self.config.base_url.trim_end_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    fn analysis_url(&self, request: &ScoringRequest) -> Result<Url> {
        let mut url = self.endpoint(ANALYSIS_PATH)?;
        url.query_pairs_mut()
            .append_pair("title", &request.title)
            .append_pair("abstract", &request.abstract_text);
        Ok(url)
    }

    /// Checks that the service answers on its health route.
    pub async fn health(&self) -> Result<()> {
        let url = self.endpoint(HEALTH_PATH)?;
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ValorizeError::Transport(format!("Health check failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ValorizeError::Transport(format!(
                "Health check returned {status}"
            )))
        }
    }
}

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Backoff before retry `attempt` (1-based): 100ms doubling, capped at 30s.
fn retry_delay(attempt: u32) -> Duration {
    2_u64
        .checked_pow(attempt.saturating_sub(1))
        .and_then(|factor| factor.checked_mul(100))
        .map_or(MAX_RETRY_DELAY, |ms| Duration::from_millis(ms).min(MAX_RETRY_DELAY))
}

#[async_trait]
impl ScoringBackend for ScoringApiClient {
    async fn score(&self, request: &ScoringRequest) -> Result<ScoringResponse> {
        let url = self.analysis_url(request)?;

        let mut last_error = None;
        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                tokio::time::sleep(retry_delay(attempt)).await;
            }

            tracing::debug!(attempt, title = %request.title, "Requesting novelty analysis");

            let response = self
                .client
                .get(url.clone())
                .header(ACCEPT, HeaderValue::from_static("application/json"))
                .send()
                .await;

            match response {
                Ok(resp) => {
                    let status = resp.status();

                    if status.is_success() {
                        let body = resp.text().await.map_err(|e| {
                            ValorizeError::Transport(format!("Failed to read response body: {e}"))
                        })?;
                        return serde_json::from_str::<ScoringResponse>(&body).map_err(|e| {
                            tracing::error!(
                                response_len = body.len(),
                                response_preview = %body.chars().take(100).collect::<String>(),
                                error = %e,
                                "Malformed scoring response"
                            );
                            ValorizeError::Transport(format!("Malformed scoring response: {e}"))
                        });
                    }

                    if status.is_server_error() {
                        let body = resp.text().await.unwrap_or_default();
                        tracing::warn!(attempt, %status, "Scoring service error, will retry");
                        last_error = Some(ValorizeError::Transport(format!(
                            "Server error {status}: {body}"
                        )));
                        continue;
                    }

                    let body = resp.text().await.unwrap_or_default();
                    return Err(ValorizeError::Transport(match status {
                        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                            format!("Not authorized ({status}): {body}")
                        }
                        _ => format!("API error {status}: {body}"),
                    }));
                }
                Err(e) => {
                    tracing::warn!(attempt, error = %e, "Scoring request failed");
                    last_error = Some(ValorizeError::Transport(format!("Request failed: {e}")));
                    continue;
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| ValorizeError::Transport("Scoring failed after retries".to_string())))
    }
}

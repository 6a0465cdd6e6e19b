use async_trait::async_trait;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

use super::{DerivedFeatures, Prediction, PredictionGateway};
use crate::config::{PredictionConfig, RequestConfig};
use crate::error::{PredictionError, PredictionResult};
use crate::questionnaire::AssessmentType;

/// HTTP client for the menopause and PCOS prediction services
#[derive(Clone)]
pub struct HttpPredictionClient {
    client: Client,
    menopause_url: Option<String>,
    pcos_url: Option<String>,
    request_config: RequestConfig,
}

impl HttpPredictionClient {
    /// Create a new prediction client
    pub fn new(config: &PredictionConfig, request_config: RequestConfig) -> PredictionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(PredictionError::Http)?;

        Ok(Self {
            client,
            menopause_url: config
                .menopause_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            pcos_url: config
                .pcos_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            request_config,
        })
    }

    fn base_url(&self, assessment_type: AssessmentType) -> Option<&str> {
        match assessment_type {
            AssessmentType::Menopause => self.menopause_url.as_deref(),
            AssessmentType::Pcos => self.pcos_url.as_deref(),
            AssessmentType::Menstrual => None,
        }
    }

    /// Execute a single request (internal)
    async fn execute_request(
        &self,
        url: &str,
        features: &DerivedFeatures,
    ) -> PredictionResult<Prediction> {
        debug!(url = %url, "Calling prediction service");

        let response = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .json(features)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PredictionError::Timeout {
                        timeout_ms: self.request_config.timeout_ms,
                    }
                } else {
                    PredictionError::Http(e)
                }
            })?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(PredictionError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        let body: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| PredictionError::InvalidResponse {
                    message: format!("Failed to parse response: {}", e),
                })?;

        Prediction::from_value(body)
    }
}

/// Longest wait between two attempts.
const MAX_BACKOFF_MS: u64 = 30_000;

/// Exponential backoff before retry number `retry` (1-based), capped.
fn backoff_delay(retry_delay_ms: u64, retry: u32) -> Duration {
    let factor = 1_u64.checked_shl(retry.saturating_sub(1)).unwrap_or(u64::MAX);
    Duration::from_millis(retry_delay_ms.saturating_mul(factor).min(MAX_BACKOFF_MS))
}

/// Client errors and malformed bodies will not improve on retry.
fn is_retryable(error: &PredictionError) -> bool {
    match error {
        PredictionError::Api { status, .. } => *status >= 500 || *status == 429,
        PredictionError::InvalidResponse { .. } => false,
        _ => true,
    }
}

#[async_trait]
impl PredictionGateway for HttpPredictionClient {
    fn supports(&self, assessment_type: AssessmentType) -> bool {
        self.base_url(assessment_type).is_some()
    }

    async fn predict(&self, features: &DerivedFeatures) -> PredictionResult<Prediction> {
        let assessment_type = features.assessment_type();
        let base_url =
            self.base_url(assessment_type)
                .ok_or_else(|| PredictionError::Unavailable {
                    message: format!("No prediction endpoint configured for {}", assessment_type),
                    retries: 0,
                })?;
        let url = format!("{}{}", base_url, features.endpoint());

        let mut last_error = None;
        let mut retries = 0;

        while retries <= self.request_config.max_retries {
            if retries > 0 {
                let delay = backoff_delay(self.request_config.retry_delay_ms, retries);
                warn!(
                    assessment_type = %assessment_type,
                    retry = retries,
                    delay_ms = delay.as_millis(),
                    "Retrying prediction request"
                );
                tokio::time::sleep(delay).await;
            }

            let start = Instant::now();

            match self.execute_request(&url, features).await {
                Ok(prediction) => {
                    info!(
                        assessment_type = %assessment_type,
                        latency_ms = start.elapsed().as_millis(),
                        "Prediction call succeeded"
                    );
                    return Ok(prediction);
                }
                Err(e) => {
                    error!(
                        assessment_type = %assessment_type,
                        error = %e,
                        latency_ms = start.elapsed().as_millis(),
                        retry = retries,
                        "Prediction call failed"
                    );
                    if !is_retryable(&e) {
                        return Err(e);
                    }
                    last_error = Some(e);
                    retries += 1;
                }
            }
        }

        Err(PredictionError::Unavailable {
            message: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "Unknown error".to_string()),
            retries,
        })
    }
}

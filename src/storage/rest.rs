use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info};

use super::{AssessmentRecord, AssessmentRecorder};
use crate::config::{RemoteStoreConfig, RequestConfig};
use crate::error::{StorageError, StorageResult};

const TABLE: &str = "health_assessments";

/// Recorder inserting rows through a PostgREST (Supabase) endpoint
#[derive(Clone)]
pub struct RestRecorder {
    client: Client,
    base_url: String,
    api_key: String,
}

impl RestRecorder {
    /// Create a new REST recorder
    pub fn new(config: &RemoteStoreConfig, request_config: &RequestConfig) -> StorageResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(request_config.timeout_ms))
            .build()
            .map_err(StorageError::Http)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Get the base URL (for testing)
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl AssessmentRecorder for RestRecorder {
    async fn save(&self, record: &AssessmentRecord) -> StorageResult<()> {
        let url = format!("{}/rest/v1/{}", self.base_url, TABLE);

        debug!(id = %record.id, url = %url, "Inserting assessment");

        let response = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        let status = response.status();

        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(StorageError::Api {
                status: status.as_u16(),
                message: error_body,
            });
        }

        info!(id = %record.id, user_id = %record.user_id, "Assessment stored remotely");
        Ok(())
    }
}

//! Assessment persistence.
//!
//! Completed assessments are appended to a `health_assessments` store,
//! either a local SQLite database or a PostgREST-compatible REST API.

mod rest;
mod sqlite;

pub use rest::RestRecorder;
pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::StorageResult;
use crate::questionnaire::{AnswerSet, AssessmentType};
use crate::scoring::RiskCategory;

/// A finished assessment as written to the store of record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    /// Unique record identifier.
    pub id: String,
    /// Owner of the assessment.
    pub user_id: String,
    /// Which questionnaire was completed.
    pub assessment_type: AssessmentType,
    /// Authoritative score (remote confidence or local score).
    pub risk_score: f64,
    /// Category derived from `risk_score`.
    pub risk_category: RiskCategory,
    /// Raw answers.
    pub responses: AnswerSet,
    /// Remote prediction payload, stored in the `recommendations` column.
    #[serde(rename = "recommendations", skip_serializing_if = "Option::is_none")]
    pub supplementary: Option<serde_json::Value>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
}

impl AssessmentRecord {
    /// Create a new record with a fresh id and the current timestamp.
    pub fn new(
        user_id: impl Into<String>,
        assessment_type: AssessmentType,
        risk_score: f64,
        risk_category: RiskCategory,
        responses: AnswerSet,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            assessment_type,
            risk_score,
            risk_category,
            responses,
            supplementary: None,
            created_at: Utc::now(),
        }
    }

    /// Attach a supplementary payload.
    pub fn with_supplementary(mut self, supplementary: serde_json::Value) -> Self {
        self.supplementary = Some(supplementary);
        self
    }
}

/// Append-only sink for completed assessments.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AssessmentRecorder: Send + Sync {
    /// Insert a single record. Never updates an existing one.
    async fn save(&self, record: &AssessmentRecord) -> StorageResult<()>;
}

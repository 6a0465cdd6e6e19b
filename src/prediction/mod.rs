//! Remote prediction gateway.
//!
//! Assessment answers are mapped to a model-specific [`DerivedFeatures`]
//! payload and posted to an external ML endpoint. The remote call is always
//! optional: [`resolve_prediction`] folds every failure into a
//! [`PredictionOutcome`] so callers can fall back to the local score.

mod client;
mod features;

pub use client::HttpPredictionClient;
pub use features::{
    age_band_midpoint, stage_inputs, DerivedFeatures, HealthProfile, MenopauseFeatures,
    PcosFeatures,
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PredictionError, PredictionResult};
use crate::questionnaire::AssessmentType;

/// Normalized response of a remote predictor.
///
/// `confidence` is reported as-is; its scale depends on the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    /// Stage or risk level label.
    pub label: String,
    /// Raw confidence value.
    pub confidence: f64,
    /// Complete response body, passed through untouched.
    pub supplementary: serde_json::Value,
}

impl Prediction {
    /// Normalize a predictor response body.
    ///
    /// The menopause model answers `{stage, confidence, probabilities}` and
    /// the PCOS model `{risk_level, risk_score, ...}`; both are accepted.
    pub fn from_value(value: serde_json::Value) -> PredictionResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PredictionError::InvalidResponse {
                message: "Expected a JSON object".to_string(),
            })?;

        let label = ["stage", "risk_level"]
            .iter()
            .find_map(|k| object.get(*k).and_then(|v| v.as_str()))
            .ok_or_else(|| PredictionError::InvalidResponse {
                message: "Missing 'stage' or 'risk_level'".to_string(),
            })?
            .to_string();

        let confidence = ["confidence", "risk_score"]
            .iter()
            .find_map(|k| object.get(*k).and_then(|v| v.as_f64()))
            .ok_or_else(|| PredictionError::InvalidResponse {
                message: "Missing numeric 'confidence' or 'risk_score'".to_string(),
            })?;

        Ok(Self {
            label,
            confidence,
            supplementary: value,
        })
    }
}

/// Outcome of the optional remote prediction step.
#[derive(Debug, Clone, PartialEq)]
pub enum PredictionOutcome {
    /// The remote predictor answered.
    RemoteSuccess(Prediction),
    /// The remote predictor was called and failed.
    RemoteFailure { reason: String },
    /// No remote call was made.
    LocalOnly,
}

impl PredictionOutcome {
    /// Remote prediction, if one succeeded.
    pub fn prediction(&self) -> Option<&Prediction> {
        match self {
            PredictionOutcome::RemoteSuccess(p) => Some(p),
            _ => None,
        }
    }

    /// Short name of the variant, used in logs and reports.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictionOutcome::RemoteSuccess(_) => "remote_success",
            PredictionOutcome::RemoteFailure { .. } => "remote_failure",
            PredictionOutcome::LocalOnly => "local_only",
        }
    }
}

/// Boundary to an external prediction service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PredictionGateway: Send + Sync {
    /// Whether a model is available for `assessment_type`.
    fn supports(&self, assessment_type: AssessmentType) -> bool;

    /// Send `features` to the matching model.
    async fn predict(&self, features: &DerivedFeatures) -> PredictionResult<Prediction>;
}

/// Run the optional remote step, never failing.
///
/// No gateway, no payload, or an unsupported type yields `LocalOnly`; an
/// error from the gateway yields `RemoteFailure`.
pub async fn resolve_prediction(
    gateway: Option<&dyn PredictionGateway>,
    features: Option<&DerivedFeatures>,
) -> PredictionOutcome {
    let (gateway, features) = match (gateway, features) {
        (Some(g), Some(f)) if g.supports(f.assessment_type()) => (g, f),
        _ => {
            debug!("No remote prediction available, using local score");
            return PredictionOutcome::LocalOnly;
        }
    };

    match gateway.predict(features).await {
        Ok(prediction) => {
            debug!(
                assessment_type = %features.assessment_type(),
                label = %prediction.label,
                confidence = prediction.confidence,
                "Remote prediction received"
            );
            PredictionOutcome::RemoteSuccess(prediction)
        }
        Err(e) => {
            warn!(
                assessment_type = %features.assessment_type(),
                error = %e,
                "Remote prediction failed, falling back to local score"
            );
            PredictionOutcome::RemoteFailure {
                reason: e.to_string(),
            }
        }
    }
}

//! Assessment finalisation.
//!
//! [`AssessmentService::finalize`] takes a completed session through the
//! optional remote prediction, classifies the authoritative score, and
//! writes exactly one record.

use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::ConfidenceScale;
use crate::error::{AppError, AppResult};
use crate::prediction::{
    resolve_prediction, stage_inputs, DerivedFeatures, HealthProfile, PredictionGateway,
};
use crate::questionnaire::AssessmentType;
use crate::scoring::{estimate_stage, MenopauseStage, RiskCategory};
use crate::session::AssessmentSession;
use crate::storage::{AssessmentRecord, AssessmentRecorder};

/// Whether the finished record reached the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SaveStatus {
    Saved { id: String },
    Failed { reason: String },
}

impl SaveStatus {
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveStatus::Saved { .. })
    }
}

/// Everything the caller shows after an assessment.
#[derive(Debug, Clone, Serialize)]
pub struct AssessmentReport {
    pub session_id: String,
    pub assessment_type: AssessmentType,
    /// Score computed from the answers alone.
    pub local_score: u8,
    /// Score used for the category and the stored record.
    pub risk_score: f64,
    pub risk_category: RiskCategory,
    /// `remote_success`, `remote_failure` or `local_only`.
    pub prediction: &'static str,
    /// Remote label (stage or risk level), if the remote call succeeded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_label: Option<String>,
    /// Rule-based stage estimate, menopause only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_stage: Option<MenopauseStage>,
    pub save: SaveStatus,
}

/// Finalises sessions against a prediction gateway and a recorder.
pub struct AssessmentService {
    gateway: Option<Arc<dyn PredictionGateway>>,
    recorder: Arc<dyn AssessmentRecorder>,
    confidence_scale: ConfidenceScale,
}

impl AssessmentService {
    /// Create a new service. Without a gateway every assessment is scored locally.
    pub fn new(
        gateway: Option<Arc<dyn PredictionGateway>>,
        recorder: Arc<dyn AssessmentRecorder>,
        confidence_scale: ConfidenceScale,
    ) -> Self {
        Self {
            gateway,
            recorder,
            confidence_scale,
        }
    }

    /// Finalise a completed session and record it.
    ///
    /// Fails only when the session is not ready (incomplete or already
    /// finalised). Prediction failures fall back to the local score and
    /// storage failures are reported in [`AssessmentReport::save`].
    pub async fn finalize(
        &self,
        session: &mut AssessmentSession,
        user_id: &str,
        profile: &HealthProfile,
    ) -> AppResult<AssessmentReport> {
        let start = Instant::now();
        let ticket = session.begin_prediction()?;
        let assessment_type = session.assessment_type();

        debug!(
            session_id = %session.id(),
            assessment_type = %assessment_type,
            local_score = session.local_score(),
            "Finalizing assessment"
        );

        let features = DerivedFeatures::derive(assessment_type, session.answers(), profile);
        let outcome = resolve_prediction(self.gateway.as_deref(), features.as_ref()).await;

        let result = match session.apply_outcome(ticket, outcome, self.confidence_scale) {
            Some(r) => r.clone(),
            None => {
                // The ticket was issued above from this same session.
                return Err(AppError::Internal {
                    message: "prediction ticket rejected by its own session".to_string(),
                });
            }
        };

        let mut record = AssessmentRecord::new(
            user_id,
            assessment_type,
            result.risk_score,
            result.risk_category,
            session.answers().clone(),
        );
        if let Some(prediction) = result.outcome.prediction() {
            record = record.with_supplementary(prediction.supplementary.clone());
        }

        let save = match self.recorder.save(&record).await {
            Ok(()) => SaveStatus::Saved {
                id: record.id.clone(),
            },
            Err(e) => {
                warn!(
                    session_id = %session.id(),
                    error = %e,
                    "Failed to save assessment"
                );
                SaveStatus::Failed {
                    reason: e.to_string(),
                }
            }
        };

        let estimated_stage = (assessment_type == AssessmentType::Menopause)
            .then(|| estimate_stage(&stage_inputs(session.answers(), profile)));

        info!(
            session_id = %session.id(),
            assessment_type = %assessment_type,
            risk_score = result.risk_score,
            risk_category = %result.risk_category,
            prediction = result.outcome.kind(),
            saved = save.is_saved(),
            latency_ms = start.elapsed().as_millis(),
            "Assessment completed"
        );

        Ok(AssessmentReport {
            session_id: session.id().to_string(),
            assessment_type,
            local_score: result.local_score,
            risk_score: result.risk_score,
            risk_category: result.risk_category,
            prediction: result.outcome.kind(),
            remote_label: result.outcome.prediction().map(|p| p.label.clone()),
            estimated_stage,
            save,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PredictionError, SessionError, StorageError};
    use crate::prediction::{MockPredictionGateway, Prediction};
    use crate::storage::MockAssessmentRecorder;
    use serde_json::json;
    use std::sync::Mutex;

    fn completed(assessment_type: AssessmentType, weight: u8) -> AssessmentSession {
        let mut session = AssessmentSession::for_type(assessment_type);
        while session.current_question().is_some() {
            session.answer_current(weight).unwrap();
        }
        session
    }

    fn lab_profile() -> HealthProfile {
        HealthProfile {
            age: Some(50.0),
            estrogen_level: Some(30.0),
            fsh_level: Some(45.0),
            ..Default::default()
        }
    }

    fn capturing_recorder(captured: Arc<Mutex<Vec<AssessmentRecord>>>) -> MockAssessmentRecorder {
        let mut recorder = MockAssessmentRecorder::new();
        recorder.expect_save().times(1).returning(move |record| {
            captured.lock().unwrap().push(record.clone());
            Ok(())
        });
        recorder
    }

    #[tokio::test]
    async fn test_gateway_failure_falls_back_to_local_score() {
        let mut gateway = MockPredictionGateway::new();
        gateway.expect_supports().return_const(true);
        gateway.expect_predict().times(1).returning(|_| {
            Err(PredictionError::Unavailable {
                message: "connection refused".to_string(),
                retries: 2,
            })
        });

        let captured = Arc::new(Mutex::new(Vec::new()));
        let service = AssessmentService::new(
            Some(Arc::new(gateway)),
            Arc::new(capturing_recorder(captured.clone())),
            ConfidenceScale::Percent,
        );

        let mut session = completed(AssessmentType::Menopause, 1);
        let report = service
            .finalize(&mut session, "user-1", &lab_profile())
            .await
            .unwrap();

        assert_eq!(report.local_score, 33);
        assert_eq!(report.risk_category, RiskCategory::Medium);
        assert_eq!(report.prediction, "remote_failure");
        assert!(report.save.is_saved());

        let records = captured.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].risk_category, RiskCategory::Medium);
        assert_eq!(records[0].risk_score, 33.0);
        assert!(records[0].supplementary.is_none());
    }

    #[tokio::test]
    async fn test_remote_success_is_authoritative() {
        let mut gateway = MockPredictionGateway::new();
        gateway.expect_supports().return_const(true);
        gateway.expect_predict().times(1).returning(|_| {
            Ok(Prediction {
                label: "Postmenopause".to_string(),
                confidence: 85.0,
                supplementary: json!({"stage": "Postmenopause", "confidence": 85.0}),
            })
        });

        let captured = Arc::new(Mutex::new(Vec::new()));
        let service = AssessmentService::new(
            Some(Arc::new(gateway)),
            Arc::new(capturing_recorder(captured.clone())),
            ConfidenceScale::Percent,
        );

        let mut session = completed(AssessmentType::Menopause, 0);
        let report = service
            .finalize(&mut session, "user-2", &lab_profile())
            .await
            .unwrap();

        assert_eq!(report.local_score, 0);
        assert_eq!(report.risk_score, 85.0);
        assert_eq!(report.risk_category, RiskCategory::High);
        assert_eq!(report.remote_label.as_deref(), Some("Postmenopause"));

        let records = captured.lock().unwrap();
        assert_eq!(records[0].risk_category, RiskCategory::High);
        assert_eq!(
            records[0].supplementary.as_ref().unwrap()["stage"],
            "Postmenopause"
        );
    }

    #[tokio::test]
    async fn test_missing_profile_skips_gateway() {
        let mut gateway = MockPredictionGateway::new();
        gateway.expect_supports().return_const(true);
        gateway.expect_predict().never();

        let captured = Arc::new(Mutex::new(Vec::new()));
        let service = AssessmentService::new(
            Some(Arc::new(gateway)),
            Arc::new(capturing_recorder(captured.clone())),
            ConfidenceScale::Percent,
        );

        let mut session = completed(AssessmentType::Menopause, 3);
        let report = service
            .finalize(&mut session, "user-3", &HealthProfile::default())
            .await
            .unwrap();

        assert_eq!(report.prediction, "local_only");
        assert_eq!(report.risk_category, RiskCategory::High);
        // Periods stopped -> 1.2 years estimate
        assert_eq!(report.estimated_stage, Some(MenopauseStage::Postmenopause));
    }

    #[tokio::test]
    async fn test_save_failure_is_reported_not_fatal() {
        let mut recorder = MockAssessmentRecorder::new();
        recorder.expect_save().times(1).returning(|_| {
            Err(StorageError::Api {
                status: 500,
                message: "insert failed".to_string(),
            })
        });

        let service =
            AssessmentService::new(None, Arc::new(recorder), ConfidenceScale::Percent);

        let mut session = completed(AssessmentType::Pcos, 2);
        let report = service
            .finalize(&mut session, "user-4", &HealthProfile::default())
            .await
            .unwrap();

        assert_eq!(report.risk_category, RiskCategory::High);
        assert!(report.estimated_stage.is_none());
        match report.save {
            SaveStatus::Failed { reason } => assert!(reason.contains("insert failed")),
            other => panic!("unexpected save status: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_incomplete_session_is_rejected() {
        let mut recorder = MockAssessmentRecorder::new();
        recorder.expect_save().never();
        let service =
            AssessmentService::new(None, Arc::new(recorder), ConfidenceScale::Percent);

        let mut session = AssessmentSession::for_type(AssessmentType::Menstrual);
        session.answer_current(1).unwrap();

        let err = service
            .finalize(&mut session, "user-5", &HealthProfile::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::Session(SessionError::Incomplete { .. })
        ));
    }

    #[tokio::test]
    async fn test_finalize_twice_is_rejected() {
        let captured = Arc::new(Mutex::new(Vec::new()));
        let service = AssessmentService::new(
            None,
            Arc::new(capturing_recorder(captured.clone())),
            ConfidenceScale::Percent,
        );

        let mut session = completed(AssessmentType::Menstrual, 1);
        service
            .finalize(&mut session, "user-6", &HealthProfile::default())
            .await
            .unwrap();
        let second = service
            .finalize(&mut session, "user-6", &HealthProfile::default())
            .await;

        assert!(matches!(
            second,
            Err(AppError::Session(SessionError::InvalidPhase { .. }))
        ));
        assert_eq!(captured.lock().unwrap().len(), 1);
    }
}

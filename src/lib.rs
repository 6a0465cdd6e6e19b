//! # Women's Health Risk Assessment
//!
//! Questionnaire-driven risk scoring for menopause, PCOS and menstrual
//! health, with an optional remote prediction step and an append-only
//! record of every completed assessment.
//!
//! ## Flow
//!
//! ```text
//! Questions → AnswerSet → local score ─┐
//!                  ↓                    ├→ classify → AssessmentRecord
//!           DerivedFeatures → remote? ──┘         (SQLite or REST)
//! ```
//!
//! The remote predictor is optional. When it is not configured, the user's
//! profile lacks the measurements it needs, or the call fails, the
//! questionnaire score is used instead.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use womens_health_assessment::{AssessmentService, AssessmentSession, AssessmentType};
//! use womens_health_assessment::config::ConfidenceScale;
//! use womens_health_assessment::prediction::HealthProfile;
//! use womens_health_assessment::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let storage = SqliteStorage::new_in_memory().await?;
//!     let service = AssessmentService::new(None, Arc::new(storage), ConfidenceScale::Percent);
//!
//!     let mut session = AssessmentSession::for_type(AssessmentType::Menopause);
//!     while session.current_question().is_some() {
//!         session.answer_current(1)?;
//!     }
//!
//!     let report = service.finalize(&mut session, "user-1", &HealthProfile::default()).await?;
//!     println!("{} ({})", report.risk_score, report.risk_category);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

/// Assessment finalisation: prediction, classification and recording.
pub mod assessment;
/// Command-line subcommands and output rendering.
pub mod cli;
/// Configuration management.
pub mod config;
/// Nearby hospital and clinic search.
pub mod doctors;
/// Error types and result aliases for the application.
pub mod error;
/// Remote prediction gateway and feature payloads.
pub mod prediction;
/// Question sets and answer collection.
pub mod questionnaire;
/// Score aggregation, risk classification and stage estimation.
pub mod scoring;
/// Per-assessment session state.
pub mod session;
/// Assessment persistence (SQLite and REST).
pub mod storage;

pub use assessment::{AssessmentReport, AssessmentService, SaveStatus};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use questionnaire::{AnswerSet, AssessmentType, QuestionSet};
pub use scoring::{classify, compute_score, RiskCategory};
pub use session::AssessmentSession;

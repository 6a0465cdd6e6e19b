//! Per-assessment session state.
//!
//! An [`AssessmentSession`] owns everything one run through a questionnaire
//! needs: its answers, the current question cursor, the phase, and the
//! final result. Sessions share nothing, so any number can run side by side.
//!
//! A remote prediction is requested with a [`PredictionTicket`] bound to the
//! session's id and generation. Resetting the session bumps the generation,
//! so a late answer to an abandoned request is dropped instead of being
//! applied to the new answers.

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::config::ConfidenceScale;
use crate::error::{AppResult, SessionError};
use crate::prediction::PredictionOutcome;
use crate::questionnaire::{AnswerSet, AssessmentType, Question, QuestionSet};
use crate::scoring::{classify, compute_score, RiskCategory};

/// Lifecycle phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    /// Answers are being gathered.
    Collecting,
    /// All questions answered; waiting on the prediction step.
    AwaitingPrediction,
    /// Result finalised.
    Completed,
}

impl SessionPhase {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionPhase::Collecting => "collecting",
            SessionPhase::AwaitingPrediction => "awaiting_prediction",
            SessionPhase::Completed => "completed",
        }
    }
}

impl std::fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Claim on a pending prediction for one session generation.
#[derive(Debug, PartialEq, Eq)]
pub struct PredictionTicket {
    session_id: Uuid,
    generation: u64,
}

impl PredictionTicket {
    /// Session the ticket was issued by.
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }
}

/// Final score and category of a session.
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentResult {
    /// Score computed from the answers alone.
    pub local_score: u8,
    /// Score used for classification and storage.
    pub risk_score: f64,
    /// Category of `risk_score`.
    pub risk_category: RiskCategory,
    /// What the prediction step produced.
    pub outcome: PredictionOutcome,
}

impl AssessmentResult {
    /// Pick the authoritative score: remote confidence (rescaled) when the
    /// remote call succeeded, else the local score.
    pub fn resolve(local_score: u8, outcome: PredictionOutcome, scale: ConfidenceScale) -> Self {
        let risk_score = match outcome.prediction() {
            Some(p) => scale.to_score(p.confidence),
            None => f64::from(local_score),
        };

        Self {
            local_score,
            risk_score,
            risk_category: classify(risk_score),
            outcome,
        }
    }
}

/// One run through a questionnaire.
#[derive(Debug, Clone)]
pub struct AssessmentSession {
    id: Uuid,
    generation: u64,
    questions: QuestionSet,
    answers: AnswerSet,
    cursor: usize,
    phase: SessionPhase,
    result: Option<AssessmentResult>,
}

impl AssessmentSession {
    /// Start a session over `questions`.
    pub fn new(questions: QuestionSet) -> Self {
        Self {
            id: Uuid::new_v4(),
            generation: 0,
            questions,
            answers: AnswerSet::new(),
            cursor: 0,
            phase: SessionPhase::Collecting,
            result: None,
        }
    }

    /// Start a session over the built-in set for `assessment_type`.
    pub fn for_type(assessment_type: AssessmentType) -> Self {
        Self::new(assessment_type.question_set())
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn questions(&self) -> &QuestionSet {
        &self.questions
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn assessment_type(&self) -> AssessmentType {
        self.questions.assessment_type()
    }

    /// Finalised result, once completed.
    pub fn result(&self) -> Option<&AssessmentResult> {
        self.result.as_ref()
    }

    /// Question under the cursor, `None` once past the last one.
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.cursor)
    }

    /// `(answered, total)` for the active question set.
    pub fn progress(&self) -> (usize, usize) {
        (self.answers.answered_in(&self.questions), self.questions.len())
    }

    /// Whether every question has an answer.
    pub fn is_complete(&self) -> bool {
        self.answers.is_complete(&self.questions)
    }

    /// Score of the answers so far.
    pub fn local_score(&self) -> u8 {
        compute_score(&self.answers, &self.questions)
    }

    fn ensure_phase(&self, expected: SessionPhase) -> Result<(), SessionError> {
        if self.phase != expected {
            return Err(SessionError::InvalidPhase {
                expected: expected.to_string(),
                found: self.phase.to_string(),
            });
        }
        Ok(())
    }

    /// Answer the question under the cursor and advance.
    pub fn answer_current(&mut self, weight: u8) -> AppResult<()> {
        self.ensure_phase(SessionPhase::Collecting)?;

        let question_id = match self.current_question() {
            Some(q) => q.id,
            None => {
                return Err(SessionError::InvalidPhase {
                    expected: "question pending".to_string(),
                    found: "all questions presented".to_string(),
                }
                .into())
            }
        };

        self.answers
            .record_answer(&self.questions, question_id, weight)?;
        self.cursor += 1;
        Ok(())
    }

    /// Answer (or re-answer) a question by id without moving the cursor.
    pub fn answer(&mut self, question_id: u32, weight: u8) -> AppResult<()> {
        self.ensure_phase(SessionPhase::Collecting)?;
        self.answers
            .record_answer(&self.questions, question_id, weight)?;
        Ok(())
    }

    /// Move the cursor back one question. Returns false at the first question.
    pub fn previous(&mut self) -> bool {
        if self.phase != SessionPhase::Collecting || self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    /// Leave the collecting phase and claim the prediction step.
    pub fn begin_prediction(&mut self) -> Result<PredictionTicket, SessionError> {
        self.ensure_phase(SessionPhase::Collecting)?;

        if !self.is_complete() {
            let (answered, total) = self.progress();
            return Err(SessionError::Incomplete { answered, total });
        }

        self.phase = SessionPhase::AwaitingPrediction;
        Ok(PredictionTicket {
            session_id: self.id,
            generation: self.generation,
        })
    }

    /// Finalise the session with a prediction outcome.
    ///
    /// A ticket from another session, an earlier generation, or a session
    /// no longer awaiting a prediction is discarded and `None` returned.
    pub fn apply_outcome(
        &mut self,
        ticket: PredictionTicket,
        outcome: PredictionOutcome,
        scale: ConfidenceScale,
    ) -> Option<&AssessmentResult> {
        if ticket.session_id != self.id
            || ticket.generation != self.generation
            || self.phase != SessionPhase::AwaitingPrediction
        {
            debug!(
                session_id = %self.id,
                ticket_session = %ticket.session_id,
                ticket_generation = ticket.generation,
                generation = self.generation,
                "Discarding stale prediction outcome"
            );
            return None;
        }

        let result = AssessmentResult::resolve(self.local_score(), outcome, scale);
        self.phase = SessionPhase::Completed;
        self.result = Some(result);
        self.result.as_ref()
    }

    /// Restart the questionnaire. Outstanding tickets become stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.answers.clear();
        self.cursor = 0;
        self.phase = SessionPhase::Collecting;
        self.result = None;
    }
}

//! Local risk scoring.
//!
//! [`compute_score`] reduces an answer set to a 0-100 severity score using a
//! single formula for every assessment type, and [`classify`] buckets any
//! score (local or remote) into a [`RiskCategory`].

mod stage;

pub use stage::{estimate_stage, MenopauseStage, StageInputs};

use serde::{Deserialize, Serialize};

use crate::questionnaire::{AnswerSet, QuestionSet};

/// Scores strictly below this are [`RiskCategory::Low`].
pub const LOW_MEDIUM_THRESHOLD: f64 = 30.0;

/// Scores at or above this are [`RiskCategory::High`].
pub const MEDIUM_HIGH_THRESHOLD: f64 = 60.0;

/// Upper bound of the normalized score scale.
pub const MAX_SCORE: u8 = 100;

/// Three-tier risk bucket, ordered low < medium < high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }

    /// Short user-facing interpretation of the category.
    pub fn summary(&self) -> &'static str {
        match self {
            RiskCategory::Low => "Low risk - mild or early symptoms",
            RiskCategory::Medium => "Moderate risk - consider consulting a doctor",
            RiskCategory::High => "High risk - medical advice recommended",
        }
    }
}

impl std::fmt::Display for RiskCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RiskCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskCategory::Low),
            "medium" | "moderate" => Ok(RiskCategory::Medium),
            "high" => Ok(RiskCategory::High),
            _ => Err(format!("Unknown risk category: {}", s)),
        }
    }
}

/// Normalize an answer set to a 0-100 score.
///
/// `round(100 * sum / (question_count * max_weight))`, rounding halves up.
/// Unanswered questions contribute zero and answers to ids outside
/// `questions` are ignored. Returns 0 for an empty set or a zero max weight.
pub fn compute_score(answers: &AnswerSet, questions: &QuestionSet) -> u8 {
    let denominator = questions.len() as u64 * u64::from(questions.max_weight());
    if denominator == 0 {
        return 0;
    }

    let sum: u64 = answers
        .iter()
        .filter(|(id, _)| questions.contains(*id))
        .map(|(_, weight)| u64::from(weight))
        .sum();

    // floor(100 * sum / d + 1/2) in integers
    let score = (200 * sum + denominator) / (2 * denominator);
    score.min(u64::from(MAX_SCORE)) as u8
}

/// Bucket a score into a risk category.
///
/// Total over all inputs: the score is clamped to `[0, 100]` first and NaN
/// is treated as 0.
pub fn classify(score: f64) -> RiskCategory {
    let score = if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, f64::from(MAX_SCORE))
    };

    if score < LOW_MEDIUM_THRESHOLD {
        RiskCategory::Low
    } else if score < MEDIUM_HIGH_THRESHOLD {
        RiskCategory::Medium
    } else {
        RiskCategory::High
    }
}

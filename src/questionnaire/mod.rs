//! Questionnaire definitions and answer collection.
//!
//! A [`QuestionSet`] is static configuration: an assessment type plus an
//! ordered list of questions, each offering options with an ordinal severity
//! weight. An [`AnswerSet`] records one chosen weight per question id.

mod builtins;

pub use builtins::{
    menopause_ids, menopause_questions, menstrual_questions, pcos_ids, pcos_questions,
};

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::error::QuestionnaireError;

/// Kind of assessment a question set (and a stored record) belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentType {
    /// Menopause stage and symptom burden.
    Menopause,
    /// Polycystic ovary syndrome risk.
    Pcos,
    /// Menstrual health and cycle regularity.
    Menstrual,
}

impl AssessmentType {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            AssessmentType::Menopause => "menopause",
            AssessmentType::Pcos => "pcos",
            AssessmentType::Menstrual => "menstrual",
        }
    }

    /// Built-in question set for this assessment type.
    pub fn question_set(&self) -> QuestionSet {
        match self {
            AssessmentType::Menopause => menopause_questions(),
            AssessmentType::Pcos => pcos_questions(),
            AssessmentType::Menstrual => menstrual_questions(),
        }
    }
}

impl std::fmt::Display for AssessmentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AssessmentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "menopause" => Ok(AssessmentType::Menopause),
            "pcos" => Ok(AssessmentType::Pcos),
            "menstrual" => Ok(AssessmentType::Menstrual),
            _ => Err(format!("Unknown assessment type: {}", s)),
        }
    }
}

/// A selectable answer with its ordinal severity weight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerOption {
    /// Text shown to the user.
    pub label: String,
    /// Severity weight, typically 0-3.
    pub weight: u8,
}

impl AnswerOption {
    /// Create a new option.
    pub fn new(label: impl Into<String>, weight: u8) -> Self {
        Self {
            label: label.into(),
            weight,
        }
    }
}

/// A single question and its options, in presentation order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within its question set.
    pub id: u32,
    /// Prompt text.
    pub text: String,
    /// Options in presentation order.
    pub options: Vec<AnswerOption>,
}

impl Question {
    /// Create a question whose options are weighted by position (0, 1, 2, ...).
    pub fn ordinal(id: u32, text: impl Into<String>, labels: &[&str]) -> Self {
        let options = labels
            .iter()
            .enumerate()
            .map(|(i, label)| AnswerOption::new(*label, i as u8))
            .collect();
        Self {
            id,
            text: text.into(),
            options,
        }
    }

    /// Create a question with explicitly weighted options.
    pub fn weighted(id: u32, text: impl Into<String>, options: Vec<AnswerOption>) -> Self {
        Self {
            id,
            text: text.into(),
            options,
        }
    }

    /// Whether `weight` is one of this question's option weights.
    pub fn accepts(&self, weight: u8) -> bool {
        self.options.iter().any(|o| o.weight == weight)
    }

    /// Largest option weight, 0 for a question without options.
    pub fn max_weight(&self) -> u8 {
        self.options.iter().map(|o| o.weight).max().unwrap_or(0)
    }

    /// Label of the option carrying `weight`, if any.
    pub fn label_for(&self, weight: u8) -> Option<&str> {
        self.options
            .iter()
            .find(|o| o.weight == weight)
            .map(|o| o.label.as_str())
    }
}

/// An ordered, validated set of questions for one assessment type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionSet {
    assessment_type: AssessmentType,
    questions: Vec<Question>,
}

impl QuestionSet {
    /// Build a question set, rejecting duplicate question ids.
    pub fn new(
        assessment_type: AssessmentType,
        questions: Vec<Question>,
    ) -> Result<Self, QuestionnaireError> {
        let mut seen = HashSet::new();
        for q in &questions {
            if !seen.insert(q.id) {
                return Err(QuestionnaireError::DuplicateQuestion { question_id: q.id });
            }
        }
        Ok(Self {
            assessment_type,
            questions,
        })
    }

    /// Assessment type this set belongs to.
    pub fn assessment_type(&self) -> AssessmentType {
        self.assessment_type
    }

    /// Questions in presentation order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Question at presentation position `index`.
    pub fn get(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Look up a question by id.
    pub fn question(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Whether the set contains a question with this id.
    pub fn contains(&self, id: u32) -> bool {
        self.question(id).is_some()
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Check if the set has no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Maximum weight among all options of all questions (0 when empty).
    pub fn max_weight(&self) -> u8 {
        self.questions
            .iter()
            .map(Question::max_weight)
            .max()
            .unwrap_or(0)
    }
}

/// Chosen weight per question id for one assessment session.
///
/// Serialises as a JSON object keyed by question id, e.g. `{"1": 2, "3": 0}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerSet {
    answers: BTreeMap<u32, u8>,
}

impl AnswerSet {
    /// Create an empty answer set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the answer to `question_id`.
    ///
    /// Re-answering a question overwrites the earlier weight.
    pub fn record_answer(
        &mut self,
        questions: &QuestionSet,
        question_id: u32,
        weight: u8,
    ) -> Result<&AnswerSet, QuestionnaireError> {
        let question = questions
            .question(question_id)
            .ok_or(QuestionnaireError::UnknownQuestion { question_id })?;

        if !question.accepts(weight) {
            return Err(QuestionnaireError::InvalidWeight {
                question_id,
                weight,
            });
        }

        self.answers.insert(question_id, weight);
        Ok(self)
    }

    /// Validate every entry of an externally supplied answer map against
    /// `questions` and build an answer set from it.
    pub fn from_answers(
        questions: &QuestionSet,
        answers: impl IntoIterator<Item = (u32, u8)>,
    ) -> Result<Self, QuestionnaireError> {
        let mut set = Self::new();
        for (id, weight) in answers {
            set.record_answer(questions, id, weight)?;
        }
        Ok(set)
    }

    /// Weight chosen for `question_id`, if answered.
    pub fn get(&self, question_id: u32) -> Option<u8> {
        self.answers.get(&question_id).copied()
    }

    /// Drop the answer to `question_id`. Returns the removed weight.
    pub fn remove(&mut self, question_id: u32) -> Option<u8> {
        self.answers.remove(&question_id)
    }

    /// Clear all answers.
    pub fn clear(&mut self) {
        self.answers.clear();
    }

    /// Number of distinct answered questions.
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Check if nothing has been answered.
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Iterate `(question_id, weight)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u8)> + '_ {
        self.answers.iter().map(|(id, w)| (*id, *w))
    }

    /// Whether every question of `questions`, and nothing else, is answered.
    pub fn is_complete(&self, questions: &QuestionSet) -> bool {
        self.answers.len() == questions.len()
            && questions.questions().iter().all(|q| self.answers.contains_key(&q.id))
    }

    /// Count of answered ids that belong to `questions`.
    pub fn answered_in(&self, questions: &QuestionSet) -> usize {
        self.answers
            .keys()
            .filter(|id| questions.contains(**id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn three_questions() -> QuestionSet {
        QuestionSet::new(
            AssessmentType::Menstrual,
            vec![
                Question::ordinal(1, "First?", &["None", "Mild", "Moderate", "Severe"]),
                Question::ordinal(2, "Second?", &["None", "Mild", "Moderate", "Severe"]),
                Question::ordinal(3, "Third?", &["No", "Yes"]),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_assessment_type_round_trip() {
        for t in [
            AssessmentType::Menopause,
            AssessmentType::Pcos,
            AssessmentType::Menstrual,
        ] {
            assert_eq!(t.as_str().parse::<AssessmentType>().unwrap(), t);
        }
        assert!("thyroid".parse::<AssessmentType>().is_err());
        assert_eq!("PCOS".parse::<AssessmentType>().unwrap(), AssessmentType::Pcos);
    }

    #[test]
    fn test_duplicate_question_ids_rejected() {
        let result = QuestionSet::new(
            AssessmentType::Menopause,
            vec![
                Question::ordinal(1, "A", &["x", "y"]),
                Question::ordinal(1, "B", &["x", "y"]),
            ],
        );
        assert_eq!(
            result.unwrap_err(),
            QuestionnaireError::DuplicateQuestion { question_id: 1 }
        );
    }

    #[test]
    fn test_max_weight() {
        let set = three_questions();
        assert_eq!(set.max_weight(), 3);

        let empty = QuestionSet::new(AssessmentType::Menopause, vec![]).unwrap();
        assert_eq!(empty.max_weight(), 0);
        assert!(empty.is_empty());
    }

    #[test]
    fn test_record_answer_rejects_unknown_question() {
        let set = three_questions();
        let mut answers = AnswerSet::new();
        let err = answers.record_answer(&set, 99, 1).unwrap_err();
        assert_eq!(err, QuestionnaireError::UnknownQuestion { question_id: 99 });
        assert!(answers.is_empty());
    }

    #[test]
    fn test_record_answer_rejects_invalid_weight() {
        let set = three_questions();
        let mut answers = AnswerSet::new();
        let err = answers.record_answer(&set, 3, 2).unwrap_err();
        assert_eq!(
            err,
            QuestionnaireError::InvalidWeight {
                question_id: 3,
                weight: 2
            }
        );
    }

    #[test]
    fn test_reanswer_overwrites() {
        let set = three_questions();

        let mut answered_twice = AnswerSet::new();
        answered_twice.record_answer(&set, 1, 3).unwrap();
        answered_twice.record_answer(&set, 1, 0).unwrap();

        let mut answered_once = AnswerSet::new();
        answered_once.record_answer(&set, 1, 0).unwrap();

        assert_eq!(answered_twice, answered_once);
        assert_eq!(answered_twice.len(), 1);
        assert_eq!(answered_twice.get(1), Some(0));
    }

    #[test]
    fn test_completion_is_order_independent() {
        let set = three_questions();

        let mut forward = AnswerSet::new();
        for id in [1, 2, 3] {
            assert!(!forward.is_complete(&set));
            forward.record_answer(&set, id, 1).unwrap();
        }
        assert!(forward.is_complete(&set));

        let mut backward = AnswerSet::new();
        for id in [3, 2, 1] {
            backward.record_answer(&set, id, 0).unwrap();
        }
        assert!(backward.is_complete(&set));
    }

    #[test]
    fn test_completion_requires_matching_ids() {
        let set = three_questions();
        let other = QuestionSet::new(
            AssessmentType::Menstrual,
            vec![
                Question::ordinal(1, "A", &["x", "y"]),
                Question::ordinal(2, "B", &["x", "y"]),
                Question::ordinal(4, "C", &["x", "y"]),
            ],
        )
        .unwrap();

        let mut answers = AnswerSet::new();
        answers.record_answer(&other, 1, 0).unwrap();
        answers.record_answer(&other, 2, 0).unwrap();
        answers.record_answer(&other, 4, 0).unwrap();

        // Same count, different ids
        assert!(!answers.is_complete(&set));
        assert_eq!(answers.answered_in(&set), 2);
    }

    #[test]
    fn test_answer_set_serializes_as_object() {
        let set = three_questions();
        let answers = AnswerSet::from_answers(&set, [(2, 3), (1, 1)]).unwrap();
        let json = serde_json::to_value(&answers).unwrap();
        assert_eq!(json, serde_json::json!({"1": 1, "2": 3}));

        let parsed: AnswerSet = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, answers);
    }

    #[test]
    fn test_question_label_lookup() {
        let set = three_questions();
        let q = set.question(3).unwrap();
        assert_eq!(q.label_for(1), Some("Yes"));
        assert_eq!(q.label_for(2), None);
    }
}

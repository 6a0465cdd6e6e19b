//! Built-in question sets.
//!
//! Every option is weighted by its position, so each set shares the same
//! 0-3 scale and the same aggregator.

use super::{AssessmentType, Question, QuestionSet};

/// Menopause question ids referenced by the feature mapping.
pub mod menopause_ids {
    pub const AGE_BAND: u32 = 1;
    pub const PERIOD_REGULARITY: u32 = 2;
    pub const HOT_FLASHES: u32 = 3;
    pub const SLEEP_QUALITY: u32 = 4;
    pub const MOOD_CHANGES: u32 = 5;
    pub const VAGINAL_DRYNESS: u32 = 6;
    pub const JOINT_PAIN: u32 = 7;
}

/// PCOS question ids referenced by the feature mapping.
pub mod pcos_ids {
    pub const CYCLE_REGULARITY: u32 = 1;
    pub const HAIR_GROWTH: u32 = 2;
    pub const HAIR_LOSS: u32 = 3;
    pub const PIMPLES: u32 = 4;
    pub const WEIGHT_GAIN: u32 = 5;
    pub const SKIN_DARKENING: u32 = 6;
    pub const FAST_FOOD: u32 = 7;
    pub const EXERCISE: u32 = 8;
}

fn build(assessment_type: AssessmentType, questions: Vec<Question>) -> QuestionSet {
    match QuestionSet::new(assessment_type, questions) {
        Ok(set) => set,
        // Ids below are literals; a duplicate is a programming error.
        Err(e) => unreachable!("built-in {} question set is invalid: {}", assessment_type, e),
    }
}

/// Seven-question menopause symptom questionnaire.
pub fn menopause_questions() -> QuestionSet {
    use menopause_ids::*;

    build(
        AssessmentType::Menopause,
        vec![
            Question::ordinal(
                AGE_BAND,
                "What is your current age?",
                &["Under 40", "40–45", "46–50", "51+"],
            ),
            Question::ordinal(
                PERIOD_REGULARITY,
                "How regular are your periods?",
                &["Regular", "Slightly irregular", "Irregular", "Stopped"],
            ),
            Question::ordinal(
                HOT_FLASHES,
                "Hot flashes or night sweats?",
                &["Never", "Occasional", "Frequent", "Daily"],
            ),
            Question::ordinal(
                SLEEP_QUALITY,
                "Sleep quality?",
                &["Good", "Sometimes poor", "Often poor", "Severe insomnia"],
            ),
            Question::ordinal(
                MOOD_CHANGES,
                "Mood changes?",
                &["None", "Mild", "Moderate", "Severe"],
            ),
            Question::ordinal(
                VAGINAL_DRYNESS,
                "Vaginal dryness?",
                &["None", "Occasional", "Frequent", "Constant"],
            ),
            Question::ordinal(
                JOINT_PAIN,
                "Joint pain?",
                &["None", "Occasional", "Regular", "Severe"],
            ),
        ],
    )
}

/// Eight-question PCOS symptom and lifestyle questionnaire.
pub fn pcos_questions() -> QuestionSet {
    use pcos_ids::*;

    build(
        AssessmentType::Pcos,
        vec![
            Question::ordinal(
                CYCLE_REGULARITY,
                "How regular is your menstrual cycle?",
                &["Regular", "Occasionally irregular", "Often irregular", "Very irregular or absent"],
            ),
            Question::ordinal(
                HAIR_GROWTH,
                "Excess hair growth on face or body?",
                &["None", "Mild", "Moderate", "Severe"],
            ),
            Question::ordinal(
                HAIR_LOSS,
                "Hair thinning or loss on the scalp?",
                &["None", "Mild", "Moderate", "Severe"],
            ),
            Question::ordinal(
                PIMPLES,
                "Acne or pimples?",
                &["Never", "Occasional", "Frequent", "Persistent"],
            ),
            Question::ordinal(
                WEIGHT_GAIN,
                "Unexplained weight gain?",
                &["No", "Slight", "Noticeable", "Significant"],
            ),
            Question::ordinal(
                SKIN_DARKENING,
                "Darkening of skin folds (neck, underarms)?",
                &["None", "Slight", "Noticeable", "Pronounced"],
            ),
            Question::ordinal(
                FAST_FOOD,
                "How often do you eat fast food?",
                &["Rarely", "Weekly", "Several times a week", "Daily"],
            ),
            Question::ordinal(
                EXERCISE,
                "How often do you exercise?",
                &["Most days", "Weekly", "Rarely", "Never"],
            ),
        ],
    )
}

/// Six-question menstrual health questionnaire.
pub fn menstrual_questions() -> QuestionSet {
    build(
        AssessmentType::Menstrual,
        vec![
            Question::ordinal(
                1,
                "How regular is your cycle?",
                &["Regular", "Slightly irregular", "Irregular", "Very irregular"],
            ),
            Question::ordinal(
                2,
                "Period pain?",
                &["None", "Mild", "Moderate", "Severe"],
            ),
            Question::ordinal(
                3,
                "Heavy bleeding?",
                &["Never", "Occasionally", "Often", "Every period"],
            ),
            Question::ordinal(
                4,
                "Spotting between periods?",
                &["Never", "Rarely", "Sometimes", "Often"],
            ),
            Question::ordinal(
                5,
                "Mood changes before your period?",
                &["None", "Mild", "Moderate", "Severe"],
            ),
            Question::ordinal(
                6,
                "Fatigue during your period?",
                &["None", "Mild", "Moderate", "Severe"],
            ),
        ],
    )
}

use serde::{Deserialize, Serialize};

use crate::questionnaire::{menopause_ids, pcos_ids, AnswerSet, AssessmentType};
use crate::scoring::StageInputs;

/// Ordinal weight at or above which a symptom counts as present.
const SYMPTOM_PRESENT_WEIGHT: u8 = 2;

/// Weight of the "Stopped" option of the period regularity question.
const PERIODS_STOPPED_WEIGHT: u8 = 3;

/// Years since last period assumed from answers alone.
const STOPPED_YEARS_ESTIMATE: f64 = 1.2;
const ONGOING_YEARS_ESTIMATE: f64 = 0.2;

/// User-supplied measurements needed by the remote predictors.
///
/// Nothing here is ever defaulted; a predictor whose required fields are
/// missing is simply not called.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthProfile {
    pub age: Option<f64>,
    pub weight_kg: Option<f64>,
    pub height_cm: Option<f64>,
    pub bmi: Option<f64>,
    pub estrogen_level: Option<f64>,
    pub fsh_level: Option<f64>,
    pub years_since_last_period: Option<f64>,
    pub cycle_length_days: Option<f64>,
    pub follicle_count_left: Option<u32>,
    pub follicle_count_right: Option<u32>,
    pub endometrium_mm: Option<f64>,
}

impl HealthProfile {
    /// BMI as supplied, or computed from weight and height.
    pub fn bmi(&self) -> Option<f64> {
        self.bmi.or_else(|| match (self.weight_kg, self.height_cm) {
            (Some(w), Some(h)) if h > 0.0 => {
                let m = h / 100.0;
                Some(w / (m * m))
            }
            _ => None,
        })
    }
}

/// Feature payload for the menopause stage predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenopauseFeatures {
    pub age: f64,
    pub estrogen: f64,
    pub fsh: f64,
    pub years_since_last_period: f64,
    pub irregular_periods: u8,
    pub missed_periods: u8,
    pub hot_flashes: u8,
    pub night_sweats: u8,
    pub sleep_problems: u8,
    pub vaginal_dryness: u8,
    pub joint_pain: u8,
}

/// Feature payload for the PCOS risk predictor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PcosFeatures {
    pub age: f64,
    pub weight: f64,
    pub bmi: f64,
    /// 1 regular, 0 irregular
    pub cycle: u8,
    pub cycle_length: f64,
    pub weight_gain: u8,
    pub hair_growth: u8,
    pub skin_darkening: u8,
    pub hair_loss: u8,
    pub pimples: u8,
    pub fast_food: u8,
    pub regular_exercise: u8,
    pub follicle_left: u32,
    pub follicle_right: u32,
    pub endometrium: f64,
}

/// Request payload for a remote predictor, one variant per model.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DerivedFeatures {
    Menopause(MenopauseFeatures),
    Pcos(PcosFeatures),
}

impl DerivedFeatures {
    /// Build the payload for `assessment_type`.
    ///
    /// Returns `None` when the type has no remote model or the profile lacks
    /// a required measurement.
    pub fn derive(
        assessment_type: AssessmentType,
        answers: &AnswerSet,
        profile: &HealthProfile,
    ) -> Option<Self> {
        match assessment_type {
            AssessmentType::Menopause => {
                MenopauseFeatures::from_answers(answers, profile).map(DerivedFeatures::Menopause)
            }
            AssessmentType::Pcos => {
                PcosFeatures::from_answers(answers, profile).map(DerivedFeatures::Pcos)
            }
            AssessmentType::Menstrual => None,
        }
    }

    /// Assessment type this payload belongs to.
    pub fn assessment_type(&self) -> AssessmentType {
        match self {
            DerivedFeatures::Menopause(_) => AssessmentType::Menopause,
            DerivedFeatures::Pcos(_) => AssessmentType::Pcos,
        }
    }

    /// Endpoint path relative to the predictor's base URL.
    pub fn endpoint(&self) -> &'static str {
        match self {
            DerivedFeatures::Menopause(_) => "/predict-menopause",
            DerivedFeatures::Pcos(_) => "/predict-pcos",
        }
    }
}

fn flag(answers: &AnswerSet, question_id: u32) -> u8 {
    u8::from(answers.get(question_id).unwrap_or(0) >= SYMPTOM_PRESENT_WEIGHT)
}

fn periods_stopped(answers: &AnswerSet) -> bool {
    answers.get(menopause_ids::PERIOD_REGULARITY) == Some(PERIODS_STOPPED_WEIGHT)
}

/// Years since last period: profile value, else estimated from answers.
fn years_since_last_period(answers: &AnswerSet, profile: &HealthProfile) -> f64 {
    profile.years_since_last_period.unwrap_or(if periods_stopped(answers) {
        STOPPED_YEARS_ESTIMATE
    } else {
        ONGOING_YEARS_ESTIMATE
    })
}

impl MenopauseFeatures {
    /// Map menopause answers plus profile lab values onto the model's features.
    pub fn from_answers(answers: &AnswerSet, profile: &HealthProfile) -> Option<Self> {
        use menopause_ids::*;

        let hot_flashes = flag(answers, HOT_FLASHES);
        Some(Self {
            age: profile.age?,
            estrogen: profile.estrogen_level?,
            fsh: profile.fsh_level?,
            years_since_last_period: years_since_last_period(answers, profile),
            irregular_periods: flag(answers, PERIOD_REGULARITY),
            missed_periods: u8::from(periods_stopped(answers)),
            hot_flashes,
            night_sweats: hot_flashes,
            sleep_problems: flag(answers, SLEEP_QUALITY),
            vaginal_dryness: flag(answers, VAGINAL_DRYNESS),
            joint_pain: flag(answers, JOINT_PAIN),
        })
    }
}

/// Midpoint of the age band chosen on the menopause questionnaire.
pub fn age_band_midpoint(weight: u8) -> f64 {
    match weight {
        0 => 38.0,
        1 => 43.0,
        2 => 48.0,
        _ => 53.0,
    }
}

/// Inputs for the local stage estimate; age falls back to the answered age
/// band when the profile omits it.
pub fn stage_inputs(answers: &AnswerSet, profile: &HealthProfile) -> StageInputs {
    use menopause_ids::*;

    let age = profile
        .age
        .unwrap_or_else(|| age_band_midpoint(answers.get(AGE_BAND).unwrap_or(0)));

    StageInputs {
        age,
        years_since_last_period: years_since_last_period(answers, profile),
        irregular_periods: flag(answers, PERIOD_REGULARITY) == 1,
        missed_periods: periods_stopped(answers),
        hot_flashes: flag(answers, HOT_FLASHES) == 1,
    }
}

impl PcosFeatures {
    /// Map PCOS answers plus profile measurements onto the model's features.
    pub fn from_answers(answers: &AnswerSet, profile: &HealthProfile) -> Option<Self> {
        use pcos_ids::*;

        // Exercise is reverse-scored: weight 0-1 means exercising regularly.
        let regular_exercise =
            u8::from(answers.get(EXERCISE).unwrap_or(0) < SYMPTOM_PRESENT_WEIGHT);

        Some(Self {
            age: profile.age?,
            weight: profile.weight_kg?,
            bmi: profile.bmi()?,
            cycle: 1 - flag(answers, CYCLE_REGULARITY),
            cycle_length: profile.cycle_length_days?,
            weight_gain: flag(answers, WEIGHT_GAIN),
            hair_growth: flag(answers, HAIR_GROWTH),
            skin_darkening: flag(answers, SKIN_DARKENING),
            hair_loss: flag(answers, HAIR_LOSS),
            pimples: flag(answers, PIMPLES),
            fast_food: flag(answers, FAST_FOOD),
            regular_exercise,
            follicle_left: profile.follicle_count_left?,
            follicle_right: profile.follicle_count_right?,
            endometrium: profile.endometrium_mm?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questionnaire::{menopause_questions, pcos_questions};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn menopause_profile() -> HealthProfile {
        HealthProfile {
            age: Some(49.0),
            estrogen_level: Some(35.0),
            fsh_level: Some(28.0),
            ..Default::default()
        }
    }

    fn pcos_profile() -> HealthProfile {
        HealthProfile {
            age: Some(24.0),
            weight_kg: Some(64.0),
            bmi: Some(25.0),
            cycle_length_days: Some(38.0),
            follicle_count_left: Some(8),
            follicle_count_right: Some(6),
            endometrium_mm: Some(7.5),
            ..Default::default()
        }
    }

    #[test]
    fn test_menopause_mapping() {
        let questions = menopause_questions();
        let answers = AnswerSet::from_answers(
            &questions,
            [(1, 2), (2, 3), (3, 2), (4, 1), (5, 3), (6, 2), (7, 0)],
        )
        .unwrap();

        let features = MenopauseFeatures::from_answers(&answers, &menopause_profile()).unwrap();
        assert_eq!(
            features,
            MenopauseFeatures {
                age: 49.0,
                estrogen: 35.0,
                fsh: 28.0,
                years_since_last_period: 1.2,
                irregular_periods: 1,
                missed_periods: 1,
                hot_flashes: 1,
                night_sweats: 1,
                sleep_problems: 0,
                vaginal_dryness: 1,
                joint_pain: 0,
            }
        );
    }

    #[test]
    fn test_menopause_profile_years_override_estimate() {
        let questions = menopause_questions();
        let answers = AnswerSet::from_answers(&questions, [(2, 1)]).unwrap();
        let profile = HealthProfile {
            years_since_last_period: Some(0.5),
            ..menopause_profile()
        };
        let features = MenopauseFeatures::from_answers(&answers, &profile).unwrap();
        assert_eq!(features.years_since_last_period, 0.5);
        assert_eq!(features.irregular_periods, 0);
        assert_eq!(features.missed_periods, 0);
    }

    #[test]
    fn test_menopause_requires_lab_values() {
        let answers = AnswerSet::new();
        let profile = HealthProfile {
            fsh_level: None,
            ..menopause_profile()
        };
        assert!(MenopauseFeatures::from_answers(&answers, &profile).is_none());
        assert!(
            DerivedFeatures::derive(AssessmentType::Menopause, &answers, &HealthProfile::default())
                .is_none()
        );
    }

    #[test]
    fn test_pcos_mapping_and_wire_format() {
        let questions = pcos_questions();
        let answers = AnswerSet::from_answers(
            &questions,
            [(1, 3), (2, 2), (3, 0), (4, 1), (5, 2), (6, 0), (7, 3), (8, 0)],
        )
        .unwrap();

        let features =
            DerivedFeatures::derive(AssessmentType::Pcos, &answers, &pcos_profile()).unwrap();
        assert_eq!(features.endpoint(), "/predict-pcos");
        assert_eq!(features.assessment_type(), AssessmentType::Pcos);

        let json = serde_json::to_value(&features).unwrap();
        assert_eq!(json["cycle"], json!(0));
        assert_eq!(json["hair_growth"], json!(1));
        assert_eq!(json["hair_loss"], json!(0));
        assert_eq!(json["pimples"], json!(0));
        assert_eq!(json["weight_gain"], json!(1));
        assert_eq!(json["fast_food"], json!(1));
        assert_eq!(json["regular_exercise"], json!(1));
        assert_eq!(json["follicle_left"], json!(8));
        assert_eq!(json["bmi"], json!(25.0));
        // Untagged: no variant wrapper on the wire
        assert!(json.get("Pcos").is_none());
    }

    #[test]
    fn test_pcos_requires_measurements() {
        let profile = HealthProfile {
            endometrium_mm: None,
            ..pcos_profile()
        };
        assert!(PcosFeatures::from_answers(&AnswerSet::new(), &profile).is_none());
    }

    #[test]
    fn test_menstrual_has_no_remote_model() {
        assert!(DerivedFeatures::derive(
            AssessmentType::Menstrual,
            &AnswerSet::new(),
            &pcos_profile()
        )
        .is_none());
    }

    #[test]
    fn test_bmi_from_weight_and_height() {
        let profile = HealthProfile {
            weight_kg: Some(100.0),
            height_cm: Some(200.0),
            ..Default::default()
        };
        assert_eq!(profile.bmi(), Some(25.0));

        let explicit = HealthProfile {
            bmi: Some(22.0),
            ..profile
        };
        assert_eq!(explicit.bmi(), Some(22.0));
        assert_eq!(HealthProfile::default().bmi(), None);
    }

    #[test]
    fn test_stage_inputs_fall_back_to_age_band() {
        let questions = menopause_questions();
        let answers = AnswerSet::from_answers(&questions, [(1, 1), (3, 3)]).unwrap();
        let inputs = stage_inputs(&answers, &HealthProfile::default());
        assert_eq!(inputs.age, 43.0);
        assert!(inputs.hot_flashes);
        assert!(!inputs.missed_periods);
        assert_eq!(inputs.years_since_last_period, 0.2);
    }
}

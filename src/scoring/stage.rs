use serde::{Deserialize, Serialize};

/// Menopause stage, as labelled by the remote stage predictor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MenopauseStage {
    Premenopause,
    Perimenopause,
    Postmenopause,
}

impl MenopauseStage {
    /// Convert to string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            MenopauseStage::Premenopause => "Premenopause",
            MenopauseStage::Perimenopause => "Perimenopause",
            MenopauseStage::Postmenopause => "Postmenopause",
        }
    }
}

impl std::fmt::Display for MenopauseStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inputs to the rule-based stage estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageInputs {
    pub age: f64,
    pub years_since_last_period: f64,
    pub irregular_periods: bool,
    pub missed_periods: bool,
    pub hot_flashes: bool,
}

/// Rule-based stage estimate; the same rule labels the remote model's
/// training data.
///
/// A year or more without a period is postmenopause. From age 40, any of
/// irregular periods, missed periods or hot flashes is perimenopause.
pub fn estimate_stage(inputs: &StageInputs) -> MenopauseStage {
    if inputs.years_since_last_period >= 1.0 {
        MenopauseStage::Postmenopause
    } else if inputs.age >= 40.0
        && (inputs.irregular_periods || inputs.missed_periods || inputs.hot_flashes)
    {
        MenopauseStage::Perimenopause
    } else {
        MenopauseStage::Premenopause
    }
}

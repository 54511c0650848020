use serde::Deserialize;

const MACRO_PREAMBLE: &str = "Based on the following user profile and diet goals, please calculate the recommended daily intake \
of portions (in grams), calories, fat (in grams), and carbohydrates (in grams) to achieve their goals.";

const PLAN_PREAMBLE: &str = "As a highly experienced personal trainer and dietician with expertise in health, nutrition, and fitness, \
use the following user profile context to provide a personalized and accurate workout and diet plan:";

/// A required form field was empty. Shown to the user as-is; no request is made.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter both profile details and diet goals.")]
    MissingProfileOrGoals,

    #[error("Please enter your detailed profile information.")]
    MissingDetailedProfile,
}

/// Inputs for the diet macro recommendation flow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MacroForm {
    pub profile: String,
    pub goals: String,
    pub notes: String,
}

impl MacroForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.profile) || is_blank(&self.goals) {
            return Err(ValidationError::MissingProfileOrGoals);
        }
        Ok(())
    }

    pub fn build_prompt(&self) -> String {
        format!(
            "{MACRO_PREAMBLE}\n\nProfile: {}\nGoals: {}\nAdditional Notes: {}",
            self.profile, self.goals, self.notes
        )
    }
}

/// Inputs for the personalized workout and diet plan flow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PlanForm {
    pub detailed_profile: String,
}

impl PlanForm {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.detailed_profile) {
            return Err(ValidationError::MissingDetailedProfile);
        }
        Ok(())
    }

    pub fn build_prompt(&self) -> String {
        format!("{PLAN_PREAMBLE}\n\n{}", self.detailed_profile)
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

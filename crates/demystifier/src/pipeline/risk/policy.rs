use serde::{Deserialize, Serialize};

/// Discretized risk label; a total function of the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    Low,
    Medium,
    High,
}

impl RiskCategory {
    pub fn label(&self) -> &'static str {
        match self {
            RiskCategory::Low => "low",
            RiskCategory::Medium => "medium",
            RiskCategory::High => "high",
        }
    }
}

/// Weight given to the model's estimate when no override is configured.
pub const DEFAULT_MODEL_WEIGHT: f64 = 0.6;

pub(crate) fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Blend the model's risk estimate with the deterministic rule score.
///
/// Out-of-range inputs from a misbehaving upstream are tolerated and clamped
/// on output, never rejected.
pub fn combine(model_score: f64, rule_score: f64, model_weight: f64) -> f64 {
    clamp_score(model_weight * model_score + (1.0 - model_weight) * rule_score)
}

/// Band a composite score into a category. Lower bounds are inclusive: 66 is
/// high, 33 is medium, anything below 33 is low. Callers rely on the exact
/// boundaries for stable labels across runs.
pub fn categorize(score: f64) -> RiskCategory {
    if score >= 66.0 {
        RiskCategory::High
    } else if score >= 33.0 {
        RiskCategory::Medium
    } else {
        RiskCategory::Low
    }
}

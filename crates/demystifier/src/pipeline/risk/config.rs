use serde::{Deserialize, Serialize};
use std::fmt;

use super::policy::DEFAULT_MODEL_WEIGHT;

/// Severity tier attached to a taxonomy pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Medium => "medium",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Severity-tagged, ordered lists of case-insensitive regex patterns.
///
/// The taxonomy is data, not code: swapping patterns never touches the
/// scoring algorithm. Patterns are matched anywhere in the clause text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTaxonomy {
    pub high: Vec<String>,
    pub medium: Vec<String>,
}

impl Default for RiskTaxonomy {
    fn default() -> Self {
        Self {
            high: vec![
                r"penalt(?:y|ies)".to_string(),
                r"indemnif".to_string(),
                r"liabilit".to_string(),
                r"arbitration".to_string(),
                r"waiv".to_string(),
                r"class action waiver".to_string(),
            ],
            medium: vec![
                r"early termination fee".to_string(),
                r"renewal".to_string(),
                r"auto-?renew".to_string(),
                r"late fee".to_string(),
                r"governing law".to_string(),
            ],
        }
    }
}

/// Tunable weights for the risk-scoring engine.
///
/// The model weight favors the externally supplied signal, while the rule
/// score remains an auditable component a hallucinated estimate cannot fully
/// override. The neutral estimate stands in for a missing or malformed model
/// score; 50.0 is a product decision (unknown risk reads as medium-neutral).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    pub model_weight: f64,
    pub neutral_estimate: f64,
    pub high_match_points: f64,
    pub medium_match_points: f64,
    pub taxonomy: RiskTaxonomy,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            model_weight: DEFAULT_MODEL_WEIGHT,
            neutral_estimate: 50.0,
            high_match_points: 40.0,
            medium_match_points: 15.0,
            taxonomy: RiskTaxonomy::default(),
        }
    }
}

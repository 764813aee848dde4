//! Deterministic risk scoring for contract clauses.
//!
//! Two independent signals per clause: an untrusted model estimate and a
//! pure rule score derived from the clause text via a severity-tagged
//! keyword taxonomy. The engine blends them under a configured weight and
//! discretizes the result, keeping the rule side fully auditable through
//! [`ScoreComponent`] trails. No I/O, no shared state; safe to call from any
//! number of threads.

mod config;
mod policy;
mod rules;

pub use config::{RiskConfig, RiskTaxonomy, Severity};
pub use policy::{categorize, combine, RiskCategory, DEFAULT_MODEL_WEIGHT};
pub use rules::RiskConfigError;

use rules::CompiledTaxonomy;
use serde::{Deserialize, Serialize};

/// Stateless scorer applying the configured taxonomy and weights.
pub struct RiskEngine {
    config: RiskConfig,
    taxonomy: CompiledTaxonomy,
}

impl RiskEngine {
    pub fn new(config: RiskConfig) -> Result<Self, RiskConfigError> {
        let taxonomy = CompiledTaxonomy::compile(&config.taxonomy)?;
        Ok(Self { config, taxonomy })
    }

    pub fn config(&self) -> &RiskConfig {
        &self.config
    }

    /// Keyword score for a clause; a pure function of the text.
    pub fn rule_score(&self, clause_text: &str) -> f64 {
        rules::score_clause(clause_text, &self.taxonomy, &self.config).0
    }

    /// Score a clause end to end. A missing or non-finite model estimate is
    /// absorbed here into the configured neutral default, so downstream
    /// arithmetic only ever sees usable numbers.
    pub fn assess(&self, clause_text: &str, model_estimate: Option<f64>) -> RiskAssessment {
        let model_risk_estimate = model_estimate
            .filter(|value| value.is_finite())
            .unwrap_or(self.config.neutral_estimate);

        let (rule_risk_score, components) =
            rules::score_clause(clause_text, &self.taxonomy, &self.config);
        let composite_score = combine(
            model_risk_estimate,
            rule_risk_score,
            self.config.model_weight,
        );

        RiskAssessment {
            model_risk_estimate,
            rule_risk_score,
            composite_score,
            risk_category: categorize(composite_score),
            components,
        }
    }
}

/// Single taxonomy contribution, kept so every rule point is explainable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    pub severity: Severity,
    pub pattern: String,
    pub points: f64,
}

/// Full scoring outcome for one clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub model_risk_estimate: f64,
    pub rule_risk_score: f64,
    pub composite_score: f64,
    pub risk_category: RiskCategory,
    pub components: Vec<ScoreComponent>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> RiskEngine {
        RiskEngine::new(RiskConfig::default()).expect("default config compiles")
    }

    #[test]
    fn missing_estimate_defaults_to_neutral() {
        let assessment = engine().assess("A plain clause about schedules.", None);
        assert_eq!(assessment.model_risk_estimate, 50.0);
        assert_eq!(assessment.rule_risk_score, 0.0);
        assert!((assessment.composite_score - 30.0).abs() < 1e-9);
        assert_eq!(assessment.risk_category, RiskCategory::Low);
    }

    #[test]
    fn non_finite_estimate_is_absorbed() {
        let assessment = engine().assess("A plain clause.", Some(f64::NAN));
        assert_eq!(assessment.model_risk_estimate, 50.0);
        assert!(assessment.composite_score.is_finite());
    }

    #[test]
    fn rule_score_ignores_the_model_estimate() {
        let engine = engine();
        let clause = "Binding arbitration governs all disputes.";
        let low = engine.assess(clause, Some(0.0));
        let high = engine.assess(clause, Some(100.0));
        assert_eq!(low.rule_risk_score, high.rule_risk_score);
        assert_ne!(low.composite_score, high.composite_score);
    }

    #[test]
    fn composite_stays_bounded_for_adversarial_estimates() {
        let engine = engine();
        let clause = "Penalties, indemnification, arbitration, and waiver of liability.";
        let assessment = engine.assess(clause, Some(100_000.0));
        assert_eq!(assessment.composite_score, 100.0);
        assert_eq!(assessment.risk_category, RiskCategory::High);

        let assessment = engine.assess("Plain clause.", Some(-100_000.0));
        assert_eq!(assessment.composite_score, 0.0);
        assert_eq!(assessment.risk_category, RiskCategory::Low);
    }

    #[test]
    fn assessment_carries_an_evidence_trail() {
        let assessment = engine().assess(
            "Early termination fee applies in addition to arbitration.",
            Some(10.0),
        );
        assert_eq!(assessment.components.len(), 2);
        assert!(assessment
            .components
            .iter()
            .any(|component| component.severity == Severity::Medium));
        assert!(assessment
            .components
            .iter()
            .any(|component| component.severity == Severity::High));
    }
}

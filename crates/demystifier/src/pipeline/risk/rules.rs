use regex::{Regex, RegexBuilder};

use super::config::{RiskConfig, RiskTaxonomy, Severity};
use super::policy::clamp_score;
use super::ScoreComponent;

/// Taxonomy patterns compiled once at engine construction so a bad pattern
/// is a construction error, never a scoring-time failure.
#[derive(Debug)]
pub(crate) struct CompiledTaxonomy {
    high: Vec<Regex>,
    medium: Vec<Regex>,
}

impl CompiledTaxonomy {
    pub(crate) fn compile(taxonomy: &RiskTaxonomy) -> Result<Self, RiskConfigError> {
        Ok(Self {
            high: compile_tier(&taxonomy.high, Severity::High)?,
            medium: compile_tier(&taxonomy.medium, Severity::Medium)?,
        })
    }
}

fn compile_tier(patterns: &[String], severity: Severity) -> Result<Vec<Regex>, RiskConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .map_err(|source| RiskConfigError {
                    severity,
                    pattern: pattern.clone(),
                    source,
                })
        })
        .collect()
}

/// A taxonomy pattern failed to compile.
#[derive(Debug, thiserror::Error)]
#[error("invalid {severity} risk pattern '{pattern}': {source}")]
pub struct RiskConfigError {
    pub severity: Severity,
    pub pattern: String,
    #[source]
    pub source: regex::Error,
}

/// Deterministic keyword score for one clause, with the per-pattern evidence
/// trail. Depends on the clause text alone; each matching pattern contributes
/// its tier's points once, and the total is clamped to 100. Components carry
/// the unclamped contributions so audits can see past the ceiling.
pub(crate) fn score_clause(
    clause_text: &str,
    taxonomy: &CompiledTaxonomy,
    config: &RiskConfig,
) -> (f64, Vec<ScoreComponent>) {
    let mut components = Vec::new();
    let mut total = 0.0;

    for pattern in &taxonomy.high {
        if pattern.is_match(clause_text) {
            total += config.high_match_points;
            components.push(ScoreComponent {
                severity: Severity::High,
                pattern: pattern.as_str().to_string(),
                points: config.high_match_points,
            });
        }
    }
    for pattern in &taxonomy.medium {
        if pattern.is_match(clause_text) {
            total += config.medium_match_points;
            components.push(ScoreComponent {
                severity: Severity::Medium,
                pattern: pattern.as_str().to_string(),
                points: config.medium_match_points,
            });
        }
    }

    (clamp_score(total), components)
}

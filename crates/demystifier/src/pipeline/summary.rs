//! Document summary records and reconciliation of extracted model output.
//!
//! The upstream model is asked for a specific JSON shape but is never
//! trusted to produce it. Reconciliation walks whatever mapping the
//! extractor recovered and coerces it field by field: missing strings become
//! empty, missing or non-numeric scores fall back to the neutral default,
//! and provenance entries keep their insertion order. The result is the one
//! serialization contract external callers depend on.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::risk::{RiskCategory, RiskEngine};

/// Evidence snippet supporting a clause or answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    pub text: String,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub start_offset: Option<u64>,
}

/// One contractual provision with both risk signals and their blend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseRecord {
    pub original_text: String,
    pub simplified_text: String,
    pub model_risk_estimate: f64,
    pub rule_risk_score: f64,
    pub composite_score: f64,
    pub risk_category: RiskCategory,
    pub provenance: Vec<Provenance>,
}

/// Structured summary returned to API callers. Field names and types are a
/// stable contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub title: Option<String>,
    pub summary: String,
    pub overall_risk_score: f64,
    pub rag_corpus_name: Option<String>,
    pub clauses: Vec<ClauseRecord>,
}

impl DocumentSummary {
    /// Coerce an extracted mapping into a summary, scoring each clause.
    pub fn reconcile(
        mapping: &Map<String, Value>,
        engine: &RiskEngine,
        rag_corpus_name: Option<String>,
    ) -> Self {
        let neutral = engine.config().neutral_estimate;
        let clauses = mapping
            .get("clauses")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| match entry.as_object() {
                        Some(clause) => Some(ClauseRecord::reconcile(clause, engine)),
                        None => {
                            debug!("dropping non-object clause entry from model output");
                            None
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            title: mapping
                .get("title")
                .and_then(Value::as_str)
                .map(str::to_string),
            summary: coerce_string(mapping.get("summary")),
            overall_risk_score: coerce_estimate(mapping.get("overall_risk_score"), neutral)
                .clamp(0.0, 100.0),
            rag_corpus_name,
            clauses,
        }
    }

    /// Minimal summary for the extraction-failure path; callers present it
    /// instead of an error.
    pub fn fallback(summary: impl Into<String>, rag_corpus_name: Option<String>) -> Self {
        Self {
            title: None,
            summary: summary.into(),
            overall_risk_score: 50.0,
            rag_corpus_name,
            clauses: Vec::new(),
        }
    }
}

impl ClauseRecord {
    fn reconcile(clause: &Map<String, Value>, engine: &RiskEngine) -> Self {
        let original_text = coerce_string(clause.get("original"));
        let estimate = clause
            .get("llm_score")
            .and_then(Value::as_f64)
            .filter(|value| value.is_finite());
        let assessment = engine.assess(&original_text, estimate);

        Self {
            original_text,
            simplified_text: coerce_string(clause.get("simplified")),
            model_risk_estimate: assessment.model_risk_estimate,
            rule_risk_score: assessment.rule_risk_score,
            composite_score: assessment.composite_score,
            risk_category: assessment.risk_category,
            provenance: coerce_provenance(clause.get("provenance")),
        }
    }
}

fn coerce_string(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_default()
}

fn coerce_estimate(value: Option<&Value>, neutral: f64) -> f64 {
    value
        .and_then(Value::as_f64)
        .filter(|score| score.is_finite())
        .unwrap_or(neutral)
}

/// Coerce a provenance array, preserving order and dropping entries with no
/// usable text.
pub(crate) fn coerce_provenance(value: Option<&Value>) -> Vec<Provenance> {
    value
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    let object = entry.as_object()?;
                    let text = object.get("text").and_then(Value::as_str)?;
                    Some(Provenance {
                        text: text.to_string(),
                        page: object
                            .get("page")
                            .and_then(Value::as_u64)
                            .and_then(|page| u32::try_from(page).ok()),
                        start_offset: object.get("start_offset").and_then(Value::as_u64),
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::risk::RiskConfig;
    use serde_json::json;

    fn engine() -> RiskEngine {
        RiskEngine::new(RiskConfig::default()).expect("default config compiles")
    }

    fn as_mapping(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other:?}"),
        }
    }

    #[test]
    fn reconcile_scores_each_clause() {
        let mapping = as_mapping(json!({
            "title": "Service Agreement",
            "summary": "A short agreement.",
            "overall_risk_score": 62,
            "clauses": [
                {
                    "original": "Disputes are settled by binding arbitration.",
                    "simplified": "You cannot sue in court.",
                    "llm_score": 80,
                    "provenance": [{"text": "Section 9", "page": 4, "start_offset": 120}]
                }
            ]
        }));

        let summary = DocumentSummary::reconcile(&mapping, &engine(), Some("corpus-1".into()));
        assert_eq!(summary.title.as_deref(), Some("Service Agreement"));
        assert_eq!(summary.overall_risk_score, 62.0);
        assert_eq!(summary.rag_corpus_name.as_deref(), Some("corpus-1"));

        let clause = &summary.clauses[0];
        assert_eq!(clause.model_risk_estimate, 80.0);
        assert_eq!(clause.rule_risk_score, 40.0);
        assert!((clause.composite_score - 64.0).abs() < 1e-9);
        assert_eq!(clause.risk_category, RiskCategory::Medium);
        assert_eq!(clause.provenance[0].page, Some(4));
        assert_eq!(clause.provenance[0].start_offset, Some(120));
    }

    #[test]
    fn missing_scores_fall_back_to_neutral_default() {
        let mapping = as_mapping(json!({
            "clauses": [
                {"original": "A plain clause.", "llm_score": null},
                {"original": "Another plain clause.", "llm_score": "not a number"}
            ]
        }));

        let summary = DocumentSummary::reconcile(&mapping, &engine(), None);
        assert_eq!(summary.overall_risk_score, 50.0);
        for clause in &summary.clauses {
            assert_eq!(clause.model_risk_estimate, 50.0);
            assert!((clause.composite_score - 30.0).abs() < 1e-9);
        }
    }

    #[test]
    fn malformed_entries_are_dropped_not_fatal() {
        let mapping = as_mapping(json!({
            "summary": 12,
            "clauses": [
                "not an object",
                {"original": "Late fee of 5% applies.", "llm_score": 20,
                 "provenance": ["bad", {"text": "p. 2"}, {"no_text": true}]}
            ]
        }));

        let summary = DocumentSummary::reconcile(&mapping, &engine(), None);
        assert_eq!(summary.summary, "");
        assert_eq!(summary.clauses.len(), 1);
        let clause = &summary.clauses[0];
        assert_eq!(clause.rule_risk_score, 15.0);
        assert_eq!(clause.provenance.len(), 1);
        assert_eq!(clause.provenance[0].text, "p. 2");
    }

    #[test]
    fn provenance_order_is_preserved() {
        let mapping = as_mapping(json!({
            "clauses": [{
                "original": "x",
                "provenance": [
                    {"text": "first"}, {"text": "second"}, {"text": "third"}
                ]
            }]
        }));
        let summary = DocumentSummary::reconcile(&mapping, &engine(), None);
        let texts: Vec<&str> = summary.clauses[0]
            .provenance
            .iter()
            .map(|entry| entry.text.as_str())
            .collect();
        assert_eq!(texts, vec!["first", "second", "third"]);
    }

    #[test]
    fn out_of_range_overall_score_is_clamped() {
        let mapping = as_mapping(json!({"overall_risk_score": 240, "clauses": []}));
        let summary = DocumentSummary::reconcile(&mapping, &engine(), None);
        assert_eq!(summary.overall_risk_score, 100.0);
    }

    #[test]
    fn serialized_field_names_are_stable() {
        let summary = DocumentSummary::fallback("Summary unavailable", Some("corpus-2".into()));
        let value = serde_json::to_value(&summary).expect("serializes");
        assert_eq!(
            value,
            json!({
                "title": null,
                "summary": "Summary unavailable",
                "overall_risk_score": 50.0,
                "rag_corpus_name": "corpus-2",
                "clauses": []
            })
        );
    }
}

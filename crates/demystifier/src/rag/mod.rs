//! Boundary to the managed retrieval-augmented-generation backend.
//!
//! The service never implements retrieval, chunking, or inference itself; it
//! marshals parameters to an external RAG provider and consumes the raw,
//! possibly malformed text that comes back. The trait keeps the pipeline
//! testable without network access.

mod vertex;

pub use vertex::VertexRagClient;

use serde::{Deserialize, Serialize};

use crate::pipeline::summary::Provenance;

/// Gateway to the RAG provider. Implementations may block; callers run them
/// on blocking-capable threads.
pub trait RagGateway: Send + Sync {
    /// Create a corpus for one session and index the document at `gcs_uri`.
    /// Returns the provider's corpus resource name.
    fn create_corpus(&self, gcs_uri: &str, session_id: &str) -> Result<String, RagError>;

    /// Ask for the structured document summary. Returns the model's raw text;
    /// the caller is responsible for extracting JSON from it.
    fn summarize(&self, corpus_name: &str) -> Result<String, RagError>;

    /// Answer a question grounded on the corpus. Returns raw generation text
    /// plus whatever retrieval evidence the provider surfaced.
    fn query(&self, corpus_name: &str, question: &str, top_k: usize)
        -> Result<RetrievedAnswer, RagError>;
}

/// Raw provider output for a question: generated text plus retrieval hits.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievedAnswer {
    pub text: String,
    pub evidence: Vec<Provenance>,
}

/// Reconciled answer returned to API callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub evidence: Vec<Provenance>,
}

#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("rag transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("rag backend rejected request ({status}): {message}")]
    Backend { status: u16, message: String },
    #[error("rag response missing {0}")]
    MalformedResponse(&'static str),
    #[error("rag credentials unavailable: {0}")]
    Credentials(&'static str),
}

/// Prompt instructing the model to emit the summary JSON shape that
/// [`crate::pipeline::summary::DocumentSummary::reconcile`] consumes. The
/// model frequently ignores the "ONLY valid JSON" instruction, which is why
/// the extractor exists.
pub(crate) const SUMMARY_PROMPT: &str = "\
You are a helpful assistant that reads legal text (clauses) and returns structured JSON.
Given the context retrieved from the provided documents, produce a JSON object with keys:
- title: string or null
- summary: short high-level summary of the document (3-5 sentences)
- overall_risk_score: a number 0-100 representing overall document risk (higher = riskier)
- clauses: an array of objects with keys:
  - original: original clause text (string)
  - simplified: simple, plain-language explanation (1-2 sentences)
  - llm_score: a numeric risk estimate 0-100
  - provenance: array of provenance objects with keys page (if available), start_offset (if available), text (snippet)
Return ONLY valid JSON. Do not include backticks or explanation.
";

/// Retrieval-only prompt used when the summary JSON cannot be recovered.
pub(crate) const FALLBACK_SUMMARY_QUESTION: &str =
    "Please provide a short summary of the document and list key clauses.";

pub(crate) fn query_prompt(question: &str) -> String {
    format!(
        "Using only the retrieved document context, answer the question concisely and cite any \
         provenance (page or snippet). Question: {question}\n\n\
         Return JSON: {{\"answer\": string, \"provenance\": [{{\"text\": string}}]}}"
    )
}

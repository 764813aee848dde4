//! Document processing pipeline: upload slots, summarization, and grounded
//! question answering.
//!
//! [`DocumentService`] owns the orchestration: raw model output flows
//! through [`extract`], per-clause records through the
//! [`risk::RiskEngine`], and the reconciled [`summary::DocumentSummary`] back
//! to the caller. The RAG and storage collaborators stay behind traits.

pub mod extract;
pub mod risk;
mod router;
pub mod summary;

pub use extract::{extract, ExtractionResult};
pub use router::document_router;
pub use summary::{ClauseRecord, DocumentSummary, Provenance};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::rag::{QueryAnswer, RagError, RagGateway, FALLBACK_SUMMARY_QUESTION};
use crate::storage::{ObjectStorage, StorageError, DEFAULT_UPLOAD_EXPIRY};
use risk::{RiskConfig, RiskConfigError, RiskEngine};

const QUERY_TOP_K: usize = 4;
const FALLBACK_TOP_K: usize = 4;
const FALLBACK_SUMMARY: &str = "Summary unavailable";

static SESSION_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_session_id() -> String {
    let id = SESSION_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    format!("sess-{:x}-{id:06}", std::process::id())
}

/// Response to an upload-slot request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadSlot {
    pub upload_url: String,
    pub object_name: String,
}

/// Service composing storage, the RAG gateway, and the risk engine.
pub struct DocumentService<G, S> {
    rag: Arc<G>,
    storage: Arc<S>,
    engine: Arc<RiskEngine>,
    bucket: String,
}

impl<G, S> DocumentService<G, S>
where
    G: RagGateway + 'static,
    S: ObjectStorage + 'static,
{
    pub fn new(
        rag: Arc<G>,
        storage: Arc<S>,
        config: RiskConfig,
        bucket: impl Into<String>,
    ) -> Result<Self, RiskConfigError> {
        Ok(Self {
            rag,
            storage,
            engine: Arc::new(RiskEngine::new(config)?),
            bucket: bucket.into(),
        })
    }

    pub fn engine(&self) -> &RiskEngine {
        &self.engine
    }

    /// Mint a fresh session object name and a signed URL to upload into it.
    pub fn create_upload_slot(&self) -> Result<UploadSlot, ServiceError> {
        let session_id = next_session_id();
        let object_name = format!("sessions/{session_id}/document.pdf");
        let upload_url = self
            .storage
            .signed_upload_url(&object_name, DEFAULT_UPLOAD_EXPIRY)?;
        Ok(UploadSlot {
            upload_url,
            object_name,
        })
    }

    /// Index an uploaded document and produce its structured summary.
    ///
    /// An unextractable model response is non-fatal: the caller gets a
    /// fallback summary built from a plain retrieval answer, mirroring how a
    /// user-facing "summary unavailable" state is assembled.
    pub fn process_document(
        &self,
        object_name: &str,
        session_id: Option<&str>,
    ) -> Result<DocumentSummary, ServiceError> {
        if object_name.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("object_name required"));
        }
        let session_id = match session_id {
            Some(id) if !id.trim().is_empty() => id.to_string(),
            _ => next_session_id(),
        };

        let gcs_uri = format!("gs://{}/{}", self.bucket, object_name);
        let corpus_name = self.rag.create_corpus(&gcs_uri, &session_id)?;
        let raw = self.rag.summarize(&corpus_name)?;

        match extract(&raw) {
            ExtractionResult::Success(mapping) => Ok(DocumentSummary::reconcile(
                &mapping,
                &self.engine,
                Some(corpus_name),
            )),
            ExtractionResult::Failure => {
                warn!(%corpus_name, "summary output held no JSON object; using retrieval fallback");
                // The fallback answer is model output too; reconcile it so
                // users see prose, never a raw JSON blob.
                let summary_text = self
                    .rag
                    .query(&corpus_name, FALLBACK_SUMMARY_QUESTION, FALLBACK_TOP_K)
                    .ok()
                    .map(reconcile_answer)
                    .map(|answer| answer.answer)
                    .filter(|text| !text.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_SUMMARY.to_string());
                Ok(DocumentSummary::fallback(summary_text, Some(corpus_name)))
            }
        }
    }

    /// Answer a free-text question against a previously processed document.
    pub fn answer_question(
        &self,
        rag_corpus: &str,
        question: &str,
    ) -> Result<QueryAnswer, ServiceError> {
        if rag_corpus.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("rag_corpus required"));
        }
        if question.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("question required"));
        }

        let retrieved = self.rag.query(rag_corpus, question, QUERY_TOP_K)?;
        Ok(reconcile_answer(retrieved))
    }

    /// Remove an uploaded document once its session is finished.
    pub fn discard_document(&self, object_name: &str) -> Result<(), ServiceError> {
        if object_name.trim().is_empty() {
            return Err(ServiceError::InvalidRequest("object_name required"));
        }
        self.storage.delete(object_name)?;
        Ok(())
    }
}

/// Fold the raw generation text into the answer contract. When the model's
/// JSON can be recovered it supplies the answer and provenance; otherwise the
/// raw text stands as the answer and the retrieval hits serve as evidence.
fn reconcile_answer(retrieved: crate::rag::RetrievedAnswer) -> QueryAnswer {
    match extract(&retrieved.text) {
        ExtractionResult::Success(mapping) => {
            let answer = mapping
                .get("answer")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| retrieved.text.clone());
            let provenance = summary::coerce_provenance(mapping.get("provenance"));
            let evidence = if provenance.is_empty() {
                retrieved.evidence
            } else {
                provenance
            };
            QueryAnswer { answer, evidence }
        }
        ExtractionResult::Failure => QueryAnswer {
            answer: retrieved.text,
            evidence: retrieved.evidence,
        },
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidRequest(&'static str),
    #[error(transparent)]
    Rag(#[from] RagError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[cfg(test)]
mod tests;

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use demystifier::pipeline::risk::RiskConfig;
use demystifier::pipeline::Provenance;
use demystifier::rag::{RagError, RagGateway, RetrievedAnswer};
use demystifier::storage::{ObjectStorage, StorageError};
use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) fn default_risk_config() -> RiskConfig {
    RiskConfig::default()
}

/// Offline RAG gateway for demos and local development. The summary text
/// deliberately wraps its JSON in prose so the extractor's recovery path is
/// exercised end to end.
#[derive(Default)]
pub(crate) struct InMemoryRagGateway;

const DEMO_SUMMARY: &str = r#"Here is the structured summary you requested:
{"title": "Residential Lease Agreement",
 "summary": "A twelve-month residential lease. Rent is due monthly, the term renews automatically, and disputes go to binding arbitration rather than court.",
 "overall_risk_score": 64,
 "clauses": [
   {"original": "Tenant agrees to indemnify and hold harmless the Landlord from any and all claims arising from Tenant's use of the premises.",
    "simplified": "If something goes wrong on the property, you pay for the landlord's losses.",
    "llm_score": 78,
    "provenance": [{"text": "Section 11 - Indemnification", "page": 5, "start_offset": 8123}]},
   {"original": "Any dispute under this lease shall be settled by binding arbitration; both parties waive the right to a jury trial.",
    "simplified": "Disagreements are decided by an arbitrator, not a court.",
    "llm_score": 70,
    "provenance": [{"text": "Section 17 - Dispute Resolution", "page": 8, "start_offset": 13950}]},
   {"original": "A late fee of five percent applies to rent received after the fifth day of the month.",
    "simplified": "Pay rent more than five days late and you owe an extra five percent.",
    "llm_score": 35,
    "provenance": [{"text": "Section 4 - Rent", "page": 2, "start_offset": 2210}]}
 ]}"#;

const DEMO_ANSWER: &str = r#"{"answer": "Yes. Section 16 states the lease renews automatically for successive twelve-month terms unless either party gives sixty days written notice.", "provenance": [{"text": "Section 16 - Renewal", "page": 7}]}"#;

impl RagGateway for InMemoryRagGateway {
    fn create_corpus(&self, _gcs_uri: &str, session_id: &str) -> Result<String, RagError> {
        Ok(format!(
            "projects/local/locations/local/ragCorpora/{session_id}"
        ))
    }

    fn summarize(&self, _corpus_name: &str) -> Result<String, RagError> {
        Ok(DEMO_SUMMARY.to_string())
    }

    fn query(
        &self,
        _corpus_name: &str,
        _question: &str,
        _top_k: usize,
    ) -> Result<RetrievedAnswer, RagError> {
        Ok(RetrievedAnswer {
            text: DEMO_ANSWER.to_string(),
            evidence: vec![Provenance {
                text: "Section 16 - Renewal".to_string(),
                page: Some(7),
                start_offset: None,
            }],
        })
    }
}

/// Storage stand-in that mints recognizable fake URLs and records deletions.
#[derive(Default)]
pub(crate) struct InMemoryObjectStorage {
    pub(crate) deleted: Mutex<Vec<String>>,
}

impl ObjectStorage for InMemoryObjectStorage {
    fn signed_upload_url(
        &self,
        object_name: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!(
            "https://storage.local.invalid/{object_name}?X-Goog-Expires={}",
            expires.as_secs()
        ))
    }

    fn delete(&self, object_name: &str) -> Result<(), StorageError> {
        self.deleted
            .lock()
            .map_err(|_| StorageError::Backend("deletion log poisoned".to_string()))?
            .push(object_name.to_string());
        Ok(())
    }
}

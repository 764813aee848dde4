use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::pipeline::risk::RiskConfig;
use crate::pipeline::summary::Provenance;
use crate::pipeline::DocumentService;
use crate::rag::{RagError, RagGateway, RetrievedAnswer};
use crate::storage::{ObjectStorage, StorageError};

/// Canned model output: valid summary JSON wrapped in the prose models
/// produce despite instructions.
pub(super) const MODEL_SUMMARY: &str = r#"Sure, here is the summary you asked for:
{"title": "Lease Agreement",
 "summary": "A one-year residential lease with automatic renewal.",
 "overall_risk_score": 58,
 "clauses": [
   {"original": "Tenant shall indemnify landlord against all claims.",
    "simplified": "You cover the landlord's losses.",
    "llm_score": 75,
    "provenance": [{"text": "Section 12", "page": 3, "start_offset": 2048}]},
   {"original": "This lease is subject to automatic renewal for successive one-year terms.",
    "simplified": "It renews on its own each year.",
    "llm_score": 40,
    "provenance": []}
 ]}
Hope that helps!"#;

pub(super) const MODEL_ANSWER: &str =
    r#"{"answer": "Yes, the lease renews automatically.", "provenance": [{"text": "Renewal clause, p. 2"}]}"#;

pub(super) struct StubRagGateway {
    pub(super) summary_text: String,
    pub(super) answer_text: String,
    pub(super) fail_queries: bool,
    pub(super) questions: Mutex<Vec<String>>,
}

impl StubRagGateway {
    pub(super) fn new(summary_text: &str, answer_text: &str) -> Self {
        Self {
            summary_text: summary_text.to_string(),
            answer_text: answer_text.to_string(),
            fail_queries: false,
            questions: Mutex::new(Vec::new()),
        }
    }

    pub(super) fn with_failing_queries(mut self) -> Self {
        self.fail_queries = true;
        self
    }
}

impl RagGateway for StubRagGateway {
    fn create_corpus(&self, _gcs_uri: &str, session_id: &str) -> Result<String, RagError> {
        Ok(format!(
            "projects/test/locations/us-central1/ragCorpora/{session_id}"
        ))
    }

    fn summarize(&self, _corpus_name: &str) -> Result<String, RagError> {
        Ok(self.summary_text.clone())
    }

    fn query(
        &self,
        _corpus_name: &str,
        question: &str,
        _top_k: usize,
    ) -> Result<RetrievedAnswer, RagError> {
        if self.fail_queries {
            return Err(RagError::MalformedResponse("candidates[0].content.parts"));
        }
        self.questions
            .lock()
            .expect("questions mutex poisoned")
            .push(question.to_string());
        Ok(RetrievedAnswer {
            text: self.answer_text.clone(),
            evidence: vec![Provenance {
                text: "retrieved chunk".to_string(),
                page: Some(2),
                start_offset: None,
            }],
        })
    }
}

#[derive(Default)]
pub(super) struct MemoryStorage {
    pub(super) deleted: Mutex<Vec<String>>,
}

impl ObjectStorage for MemoryStorage {
    fn signed_upload_url(
        &self,
        object_name: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        Ok(format!(
            "https://storage.example.invalid/{object_name}?expires={}",
            expires.as_secs()
        ))
    }

    fn delete(&self, object_name: &str) -> Result<(), StorageError> {
        self.deleted
            .lock()
            .expect("deleted mutex poisoned")
            .push(object_name.to_string());
        Ok(())
    }
}

pub(super) type TestService = DocumentService<StubRagGateway, MemoryStorage>;

pub(super) fn build_service(
    rag: StubRagGateway,
) -> (Arc<TestService>, Arc<StubRagGateway>, Arc<MemoryStorage>) {
    let rag = Arc::new(rag);
    let storage = Arc::new(MemoryStorage::default());
    let service = DocumentService::new(
        rag.clone(),
        storage.clone(),
        RiskConfig::default(),
        "demystifier-test",
    )
    .expect("default risk config compiles");
    (Arc::new(service), rag, storage)
}

use std::time::Duration;

use serde_json::{json, Value};
use tracing::info;

use super::{query_prompt, RagError, RagGateway, RetrievedAnswer, SUMMARY_PROMPT};
use crate::config::GcpConfig;
use crate::pipeline::summary::Provenance;

const EMBEDDING_PUBLISHER_MODEL: &str = "publishers/google/models/text-embedding-003";
const CHUNK_SIZE: u32 = 512;
const CHUNK_OVERLAP: u32 = 100;
const MAX_EMBEDDING_REQUESTS_PER_MIN: u32 = 1000;
const SUMMARY_TOP_K: usize = 6;
// Corpus import is asynchronous on the provider side; a short pause before
// the first generation call avoids querying an empty index. Production-grade
// behavior would poll the file listing instead.
const IMPORT_SETTLE: Duration = Duration::from_secs(6);

/// Client for the Vertex AI RAG surface over its REST API.
///
/// Uses the blocking HTTP client; the document service runs gateway calls on
/// blocking-capable threads. Token acquisition is left to the caller (the
/// original deployment relies on ambient credentials), so the bearer token
/// arrives through configuration.
pub struct VertexRagClient {
    http: reqwest::blocking::Client,
    project: String,
    region: String,
    model: String,
    access_token: Option<String>,
}

impl VertexRagClient {
    pub fn new(project: impl Into<String>, region: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            project: project.into(),
            region: region.into(),
            model: model.into(),
            access_token: None,
        }
    }

    /// Build from loaded configuration; `None` when no project is configured.
    pub fn from_config(config: &GcpConfig) -> Option<Self> {
        let project = config.project.clone()?;
        let mut client = Self::new(project, config.region.clone(), config.rag_model.clone());
        client.access_token = config.access_token.clone();
        Some(client)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    fn endpoint(&self) -> String {
        format!("https://{}-aiplatform.googleapis.com/v1", self.region)
    }

    fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project, self.region)
    }

    fn token(&self) -> Result<&str, RagError> {
        self.access_token
            .as_deref()
            .ok_or(RagError::Credentials("GCP_ACCESS_TOKEN is not set"))
    }

    fn post_json(&self, url: &str, body: Value) -> Result<Value, RagError> {
        let response = self
            .http
            .post(url)
            .bearer_auth(self.token()?)
            .json(&body)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().unwrap_or_default();
            return Err(RagError::Backend {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json()?)
    }

    /// Run a generation request with the corpus wired in as a retrieval tool,
    /// returning the concatenated candidate text.
    fn generate_content(
        &self,
        corpus_name: &str,
        prompt: &str,
        top_k: usize,
    ) -> Result<String, RagError> {
        let url = format!(
            "{}/{}/publishers/google/models/{}:generateContent",
            self.endpoint(),
            self.parent(),
            self.model
        );
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "tools": [{
                "retrieval": {
                    "vertexRagStore": {
                        "ragResources": [{"ragCorpus": corpus_name}],
                        "similarityTopK": top_k,
                    }
                }
            }],
        });

        let response = self.post_json(&url, body)?;
        let parts = response
            .pointer("/candidates/0/content/parts")
            .and_then(Value::as_array)
            .ok_or(RagError::MalformedResponse("candidates[0].content.parts"))?;

        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text").and_then(Value::as_str))
            .collect();
        Ok(text)
    }

    fn retrieve_contexts(
        &self,
        corpus_name: &str,
        question: &str,
        top_k: usize,
    ) -> Result<Vec<Provenance>, RagError> {
        let url = format!("{}/{}:retrieveContexts", self.endpoint(), self.parent());
        let body = json!({
            "vertexRagStore": {
                "ragResources": [{"ragCorpus": corpus_name}],
            },
            "query": {
                "text": question,
                "ragRetrievalConfig": {"topK": top_k},
            },
        });

        let response = self.post_json(&url, body)?;
        let contexts = response
            .pointer("/contexts/contexts")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(contexts
            .iter()
            .filter_map(|context| {
                let text = context.get("text").and_then(Value::as_str)?;
                Some(Provenance {
                    text: text.to_string(),
                    page: None,
                    start_offset: None,
                })
            })
            .collect())
    }
}

impl RagGateway for VertexRagClient {
    fn create_corpus(&self, gcs_uri: &str, session_id: &str) -> Result<String, RagError> {
        let display_name = format!("corpus_{session_id}");
        info!(%display_name, %gcs_uri, "creating rag corpus and importing document");

        let url = format!("{}/{}/ragCorpora", self.endpoint(), self.parent());
        let body = json!({
            "displayName": display_name,
            "backendConfig": {
                "ragEmbeddingModelConfig": {
                    "vertexPredictionEndpoint": {
                        "publisherModel": EMBEDDING_PUBLISHER_MODEL,
                    }
                }
            },
        });
        let response = self.post_json(&url, body)?;

        // Corpus creation is a long-running operation; the resource name is
        // carried in the operation metadata.
        let corpus_name = response
            .pointer("/metadata/ragCorpus")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| {
                response
                    .get("name")
                    .and_then(Value::as_str)
                    .map(|name| name.split("/operations/").next().unwrap_or(name).to_string())
            })
            .ok_or(RagError::MalformedResponse("rag corpus resource name"))?;

        let import_url = format!("{}/{}/ragFiles:import", self.endpoint(), corpus_name);
        let import_body = json!({
            "importRagFilesConfig": {
                "gcsSource": {"uris": [gcs_uri]},
                "ragFileTransformationConfig": {
                    "ragFileChunkingConfig": {
                        "fixedLengthChunking": {
                            "chunkSize": CHUNK_SIZE,
                            "chunkOverlap": CHUNK_OVERLAP,
                        }
                    }
                },
                "maxEmbeddingRequestsPerMin": MAX_EMBEDDING_REQUESTS_PER_MIN,
            }
        });
        self.post_json(&import_url, import_body)?;

        info!(%corpus_name, "corpus import started; waiting for indexing to settle");
        std::thread::sleep(IMPORT_SETTLE);
        Ok(corpus_name)
    }

    fn summarize(&self, corpus_name: &str) -> Result<String, RagError> {
        info!(%corpus_name, "requesting structured summary");
        self.generate_content(corpus_name, SUMMARY_PROMPT, SUMMARY_TOP_K)
    }

    fn query(
        &self,
        corpus_name: &str,
        question: &str,
        top_k: usize,
    ) -> Result<RetrievedAnswer, RagError> {
        info!(%corpus_name, "answering question against corpus");
        let evidence = self.retrieve_contexts(corpus_name, question, top_k)?;
        let text = self.generate_content(corpus_name, &query_prompt(question), top_k)?;
        Ok(RetrievedAnswer { text, evidence })
    }
}

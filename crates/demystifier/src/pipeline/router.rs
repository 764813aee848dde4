use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::{DocumentService, ServiceError};
use crate::rag::RagGateway;
use crate::storage::ObjectStorage;

/// Router builder exposing the three document operations.
pub fn document_router<G, S>(service: Arc<DocumentService<G, S>>) -> Router
where
    G: RagGateway + 'static,
    S: ObjectStorage + 'static,
{
    Router::new()
        .route("/api/v1/upload", post(upload_handler::<G, S>))
        .route("/api/v1/process", post(process_handler::<G, S>))
        .route("/api/v1/query", post(query_handler::<G, S>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ProcessRequest {
    #[serde(default)]
    pub(crate) object_name: Option<String>,
    #[serde(default)]
    pub(crate) session_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct QueryRequest {
    #[serde(default)]
    pub(crate) rag_corpus: Option<String>,
    #[serde(default)]
    pub(crate) question: Option<String>,
}

pub(crate) async fn upload_handler<G, S>(
    State(service): State<Arc<DocumentService<G, S>>>,
) -> Response
where
    G: RagGateway + 'static,
    S: ObjectStorage + 'static,
{
    // Gateways may block on the network, so service calls run off the
    // async workers.
    let result = tokio::task::spawn_blocking(move || service.create_upload_slot()).await;
    match result {
        Ok(Ok(slot)) => (StatusCode::OK, Json(slot)).into_response(),
        Ok(Err(error)) => service_error_response(error),
        Err(join_error) => join_error_response(join_error),
    }
}

pub(crate) async fn process_handler<G, S>(
    State(service): State<Arc<DocumentService<G, S>>>,
    Json(request): Json<ProcessRequest>,
) -> Response
where
    G: RagGateway + 'static,
    S: ObjectStorage + 'static,
{
    let result = tokio::task::spawn_blocking(move || {
        service.process_document(
            request.object_name.as_deref().unwrap_or(""),
            request.session_id.as_deref(),
        )
    })
    .await;
    match result {
        Ok(Ok(summary)) => (StatusCode::OK, Json(summary)).into_response(),
        Ok(Err(error)) => service_error_response(error),
        Err(join_error) => join_error_response(join_error),
    }
}

pub(crate) async fn query_handler<G, S>(
    State(service): State<Arc<DocumentService<G, S>>>,
    Json(request): Json<QueryRequest>,
) -> Response
where
    G: RagGateway + 'static,
    S: ObjectStorage + 'static,
{
    let result = tokio::task::spawn_blocking(move || {
        service.answer_question(
            request.rag_corpus.as_deref().unwrap_or(""),
            request.question.as_deref().unwrap_or(""),
        )
    })
    .await;
    match result {
        Ok(Ok(answer)) => (StatusCode::OK, Json(answer)).into_response(),
        Ok(Err(error)) => service_error_response(error),
        Err(join_error) => join_error_response(join_error),
    }
}

fn service_error_response(error: ServiceError) -> Response {
    let status = match &error {
        ServiceError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
        ServiceError::Rag(_) | ServiceError::Storage(_) => StatusCode::BAD_GATEWAY,
    };
    let payload = json!({ "error": error.to_string() });
    (status, Json(payload)).into_response()
}

fn join_error_response(join_error: tokio::task::JoinError) -> Response {
    let payload = json!({ "error": format!("worker task failed: {join_error}") });
    (StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response()
}

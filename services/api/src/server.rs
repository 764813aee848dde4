use crate::cli::ServeArgs;
use crate::infra::{default_risk_config, AppState, InMemoryObjectStorage, InMemoryRagGateway};
use crate::routes::with_operational_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use demystifier::config::AppConfig;
use demystifier::error::AppError;
use demystifier::pipeline::{document_router, DocumentService};
use demystifier::rag::VertexRagClient;
use demystifier::storage::GcsObjectStorage;
use demystifier::telemetry;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry, config.environment)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let document_routes = build_document_routes(&config).await?;
    let app = with_operational_routes(document_routes)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "legal document demystifier backend ready");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Wire the document service against real GCP backends when configuration is
/// complete, and in-memory adapters otherwise so local runs need no
/// credentials. Client construction happens on a blocking thread because the
/// gateways use blocking HTTP internals.
async fn build_document_routes(config: &AppConfig) -> Result<axum::Router, AppError> {
    let gcp = config.gcp.clone();
    let risk_config = default_risk_config();

    tokio::task::spawn_blocking(move || -> Result<axum::Router, AppError> {
        let vertex = VertexRagClient::from_config(&gcp);
        let storage = GcsObjectStorage::from_config(&gcp);
        match (vertex, storage, gcp.bucket.clone()) {
            (Some(rag), Some(storage), Some(bucket)) => {
                info!("document routes wired against Vertex RAG and Cloud Storage");
                let service =
                    DocumentService::new(Arc::new(rag), Arc::new(storage), risk_config, bucket)?;
                Ok(document_router(Arc::new(service)))
            }
            _ => {
                warn!("GCP configuration incomplete; serving with in-memory adapters");
                let bucket = gcp
                    .bucket
                    .unwrap_or_else(|| "demystifier-local".to_string());
                let service = DocumentService::new(
                    Arc::new(InMemoryRagGateway),
                    Arc::new(InMemoryObjectStorage::default()),
                    risk_config,
                    bucket,
                )?;
                Ok(document_router(Arc::new(service)))
            }
        }
    })
    .await
    .map_err(|join_error| {
        AppError::Io(std::io::Error::other(format!(
            "client construction task failed: {join_error}"
        )))
    })?
}

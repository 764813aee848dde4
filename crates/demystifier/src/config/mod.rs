use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub gcp: GcpConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            gcp: GcpConfig::from_env(),
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Google Cloud integration settings for the RAG backend and object storage.
///
/// Every field is optional at load time; the server falls back to in-memory
/// adapters when the relevant subset is incomplete, so local development and
/// CI never require cloud credentials.
#[derive(Debug, Clone, Default)]
pub struct GcpConfig {
    /// GCP project hosting the Vertex RAG corpora (`GCP_PROJECT`).
    pub project: Option<String>,
    /// Vertex region (`GCP_REGION`, default `us-central1`).
    pub region: String,
    /// Bucket receiving uploaded documents (`GCS_BUCKET`).
    pub bucket: Option<String>,
    /// Generative model used for summarization and answers (`RAG_MODEL`).
    pub rag_model: String,
    /// Bearer token for Vertex and the GCS JSON API (`GCP_ACCESS_TOKEN`).
    pub access_token: Option<String>,
    /// HMAC key id used for V4 signed upload URLs (`GCS_HMAC_KEY_ID`).
    pub hmac_key_id: Option<String>,
    /// HMAC secret paired with the key id (`GCS_HMAC_SECRET`).
    pub hmac_secret: Option<String>,
}

impl GcpConfig {
    fn from_env() -> Self {
        Self {
            project: env::var("GCP_PROJECT").ok(),
            region: env::var("GCP_REGION").unwrap_or_else(|_| "us-central1".to_string()),
            bucket: env::var("GCS_BUCKET").ok(),
            rag_model: env::var("RAG_MODEL").unwrap_or_else(|_| "gemini-1.5-pro".to_string()),
            access_token: env::var("GCP_ACCESS_TOKEN").ok(),
            hmac_key_id: env::var("GCS_HMAC_KEY_ID").ok(),
            hmac_secret: env::var("GCS_HMAC_SECRET").ok(),
        }
    }

    /// True when the Vertex RAG client can be constructed.
    pub fn vertex_ready(&self) -> bool {
        self.project.is_some() && self.bucket.is_some()
    }

    /// True when real signed upload URLs can be produced.
    pub fn storage_ready(&self) -> bool {
        self.bucket.is_some() && self.hmac_key_id.is_some() && self.hmac_secret.is_some()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

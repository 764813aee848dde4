use std::time::Duration;

use chrono::Utc;
use tracing::info;

use super::signing::{self, SignedUrlRequest};
use super::{ObjectStorage, StorageError, UPLOAD_CONTENT_TYPE};
use crate::config::GcpConfig;

/// Google Cloud Storage adapter. Signed upload URLs are computed locally
/// from an HMAC service-account key; deletion goes through the JSON API with
/// a caller-supplied bearer token.
pub struct GcsObjectStorage {
    http: reqwest::blocking::Client,
    bucket: String,
    hmac_key_id: String,
    hmac_secret: String,
    access_token: Option<String>,
}

impl GcsObjectStorage {
    pub fn new(
        bucket: impl Into<String>,
        hmac_key_id: impl Into<String>,
        hmac_secret: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::blocking::Client::new(),
            bucket: bucket.into(),
            hmac_key_id: hmac_key_id.into(),
            hmac_secret: hmac_secret.into(),
            access_token: None,
        }
    }

    /// Build from loaded configuration; `None` when the HMAC credentials or
    /// bucket are incomplete.
    pub fn from_config(config: &GcpConfig) -> Option<Self> {
        let bucket = config.bucket.clone()?;
        let key_id = config.hmac_key_id.clone()?;
        let secret = config.hmac_secret.clone()?;
        let mut storage = Self::new(bucket, key_id, secret);
        storage.access_token = config.access_token.clone();
        Some(storage)
    }

    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }
}

impl ObjectStorage for GcsObjectStorage {
    fn signed_upload_url(
        &self,
        object_name: &str,
        expires: Duration,
    ) -> Result<String, StorageError> {
        let request = SignedUrlRequest {
            method: "PUT",
            bucket: &self.bucket,
            object: object_name,
            content_type: UPLOAD_CONTENT_TYPE,
            key_id: &self.hmac_key_id,
            timestamp: Utc::now(),
            expires_secs: expires.as_secs(),
        };
        Ok(signing::signed_url(&self.hmac_secret, &request))
    }

    fn delete(&self, object_name: &str) -> Result<(), StorageError> {
        let token = self
            .access_token
            .as_deref()
            .ok_or(StorageError::Credentials("GCP_ACCESS_TOKEN is not set"))?;

        let url = format!(
            "https://storage.googleapis.com/storage/v1/b/{}/o/{}",
            self.bucket,
            signing::percent_encode(object_name),
        );
        let response = self.http.delete(&url).bearer_auth(token).send()?;

        let status = response.status();
        if !status.is_success() {
            return Err(StorageError::Backend(format!(
                "delete of {object_name} returned {status}"
            )));
        }
        info!(%object_name, "deleted uploaded document");
        Ok(())
    }
}

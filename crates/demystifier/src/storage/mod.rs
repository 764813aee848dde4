//! Boundary to the object store holding uploaded documents.
//!
//! Clients upload directly to storage through short-lived signed PUT URLs;
//! the service itself only mints URLs and deletes blobs by object name.

mod gcs;
mod signing;

pub use gcs::GcsObjectStorage;

use std::time::Duration;

/// Content type enforced on signed uploads.
pub const UPLOAD_CONTENT_TYPE: &str = "application/pdf";

/// Lifetime of a minted upload URL.
pub const DEFAULT_UPLOAD_EXPIRY: Duration = Duration::from_secs(15 * 60);

/// Storage abstraction so the document service can run without cloud
/// credentials in tests and demos.
pub trait ObjectStorage: Send + Sync {
    /// Mint a signed PUT URL for `object_name`, valid for `expires`.
    fn signed_upload_url(&self, object_name: &str, expires: Duration)
        -> Result<String, StorageError>;

    /// Delete the blob at `object_name`.
    fn delete(&self, object_name: &str) -> Result<(), StorageError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage backend error: {0}")]
    Backend(String),
    #[error("storage credentials incomplete: {0}")]
    Credentials(&'static str),
    #[error("storage transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

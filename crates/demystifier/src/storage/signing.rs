//! GCS V4 signed URLs with HMAC service-account keys (GOOG4-HMAC-SHA256).
//!
//! The canonical request and string-to-sign are pure string constructions,
//! kept separate from the keyed step so they can be verified offline with a
//! pinned timestamp.

use chrono::{DateTime, Utc};
use ring::{digest, hmac};

const HOST: &str = "storage.googleapis.com";
const ALGORITHM: &str = "GOOG4-HMAC-SHA256";
// GCS V4 scope uses the literal region "auto".
const SCOPE_SUFFIX: &str = "auto/storage/goog4_request";

pub(crate) struct SignedUrlRequest<'a> {
    pub method: &'a str,
    pub bucket: &'a str,
    pub object: &'a str,
    pub content_type: &'a str,
    pub key_id: &'a str,
    pub timestamp: DateTime<Utc>,
    pub expires_secs: u64,
}

impl SignedUrlRequest<'_> {
    fn scope(&self) -> String {
        format!("{}/{}", self.timestamp.format("%Y%m%d"), SCOPE_SUFFIX)
    }

    fn datetime(&self) -> String {
        self.timestamp.format("%Y%m%dT%H%M%SZ").to_string()
    }

    fn path(&self) -> String {
        // Object names contain '/' separators that stay literal in the path.
        let encoded: Vec<String> = self
            .object
            .split('/')
            .map(|segment| percent_encode(segment))
            .collect();
        format!("/{}/{}", self.bucket, encoded.join("/"))
    }

    /// Query parameters in lexicographic order, as signing requires.
    fn query(&self) -> String {
        let credential = format!("{}/{}", self.key_id, self.scope());
        let params = [
            ("X-Goog-Algorithm", ALGORITHM.to_string()),
            ("X-Goog-Credential", credential),
            ("X-Goog-Date", self.datetime()),
            ("X-Goog-Expires", self.expires_secs.to_string()),
            ("X-Goog-SignedHeaders", "content-type;host".to_string()),
        ];
        params
            .iter()
            .map(|(name, value)| format!("{name}={}", percent_encode(value)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

pub(crate) fn canonical_request(request: &SignedUrlRequest<'_>) -> String {
    format!(
        "{method}\n{path}\n{query}\ncontent-type:{content_type}\nhost:{HOST}\n\ncontent-type;host\nUNSIGNED-PAYLOAD",
        method = request.method,
        path = request.path(),
        query = request.query(),
        content_type = request.content_type,
    )
}

pub(crate) fn string_to_sign(request: &SignedUrlRequest<'_>) -> String {
    let digest = digest::digest(&digest::SHA256, canonical_request(request).as_bytes());
    format!(
        "{ALGORITHM}\n{datetime}\n{scope}\n{hash}",
        datetime = request.datetime(),
        scope = request.scope(),
        hash = hex::encode(digest.as_ref()),
    )
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    hmac::sign(&key, data).as_ref().to_vec()
}

fn derive_signing_key(secret: &str, request: &SignedUrlRequest<'_>) -> Vec<u8> {
    let date = request.timestamp.format("%Y%m%d").to_string();
    let key = hmac_sha256(format!("GOOG4{secret}").as_bytes(), date.as_bytes());
    let key = hmac_sha256(&key, b"auto");
    let key = hmac_sha256(&key, b"storage");
    hmac_sha256(&key, b"goog4_request")
}

pub(crate) fn signature(secret: &str, request: &SignedUrlRequest<'_>) -> String {
    let key = derive_signing_key(secret, request);
    hex::encode(hmac_sha256(&key, string_to_sign(request).as_bytes()))
}

pub(crate) fn signed_url(secret: &str, request: &SignedUrlRequest<'_>) -> String {
    format!(
        "https://{HOST}{path}?{query}&X-Goog-Signature={signature}",
        path = request.path(),
        query = request.query(),
        signature = signature(secret, request),
    )
}

/// RFC 3986 percent-encoding with the unreserved set only; everything else,
/// including '/' and ':', is escaped. Applied per path segment and to query
/// values.
pub(crate) fn percent_encode(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

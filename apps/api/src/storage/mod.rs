//! Document Store: key/value persistence of JSON and HTML blobs.
//!
//! Keys are `/`-separated strings such as `alice/profile.json`. Every backend
//! validates keys with [`validate_key`] before touching the medium, so a key that
//! tries to climb out of its namespace is rejected regardless of backend.
//!
//! Backends are interchangeable behind `Arc<dyn DocumentStore>` in `AppState`.

use async_trait::async_trait;
use bytes::Bytes;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::warn;

pub mod fs;
pub mod keys;
pub mod memory;
pub mod s3;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=utf-8";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("invalid profile name: {0:?}")]
    InvalidProfileName(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object storage error: {0}")]
    S3(String),

    #[error("document '{0}' exists but could not be read")]
    Unreadable(String),

    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// The storage contract every backend implements.
///
/// No transactional guarantee spans multiple keys.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns `Ok(None)` when the key does not exist.
    async fn get(&self, key: &str) -> Result<Option<Bytes>, StoreError>;

    async fn put(&self, key: &str, body: Bytes, content_type: &str) -> Result<(), StoreError>;

    async fn exists(&self, key: &str) -> Result<bool, StoreError>;

    /// Deleting a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Rejects empty keys, absolute keys, backslashes, NUL bytes and any `.`/`..`
/// or empty path segment.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    let invalid = key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.contains('\0')
        || key
            .split('/')
            .any(|segment| segment.is_empty() || segment == "." || segment == "..");

    if invalid {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Outcome of reading a JSON document, keeping the degraded cases distinguishable.
#[derive(Debug)]
pub enum JsonRead<T> {
    Found(T),
    Absent,
    /// The key exists but could not be read or parsed. Callers treat this like
    /// `Absent`; it is kept separate so the fallback can be asserted on.
    Unreadable,
}

impl<T> JsonRead<T> {
    /// Collapses the read into "value or absent". Unreadable documents count as absent.
    pub fn into_option(self) -> Option<T> {
        match self {
            JsonRead::Found(value) => Some(value),
            JsonRead::Absent | JsonRead::Unreadable => None,
        }
    }
}

/// Reads and parses a JSON document.
///
/// I/O failures and malformed JSON never propagate: they come back as
/// [`JsonRead::Unreadable`] after a warning is logged. Only an invalid key is
/// surfaced as an error, since that is a caller bug rather than a storage fault.
pub async fn read_json<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    key: &str,
) -> Result<JsonRead<T>, StoreError> {
    validate_key(key)?;

    let bytes = match store.get(key).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return Ok(JsonRead::Absent),
        Err(e) => {
            warn!("Read of '{key}' failed, treating as absent: {e}");
            return Ok(JsonRead::Unreadable);
        }
    };

    match serde_json::from_slice::<T>(&bytes) {
        Ok(value) => Ok(JsonRead::Found(value)),
        Err(e) => {
            warn!("Document '{key}' is not valid JSON, treating as absent: {e}");
            Ok(JsonRead::Unreadable)
        }
    }
}

/// Serializes `value` as four-space indented JSON and stores it.
pub async fn write_json<T: serde::Serialize + ?Sized>(
    store: &dyn DocumentStore,
    key: &str,
    value: &T,
) -> Result<(), StoreError> {
    let body = to_indented_json(value)?;
    store.put(key, Bytes::from(body), JSON_CONTENT_TYPE).await
}

/// Four-space indentation keeps documents byte-compatible with those written by
/// earlier releases.
pub fn to_indented_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, StoreError> {
    let mut out = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut out, formatter);
    value.serialize(&mut serializer)?;
    Ok(out)
}

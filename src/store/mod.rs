//! Document store
//!
//! Entities are persisted as JSON objects grouped into named collections.
//! Every stored document carries a string `_id` assigned on insert. Updates
//! are shallow merge patches: top-level keys in the patch replace the stored
//! ones and `_id` can never be patched.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

pub use self::memory::InMemoryStore;
pub use self::postgres::PostgresStore;

/// A stored JSON object
pub type Document = Map<String, Value>;

/// Field holding the document identifier
pub const ID_FIELD: &str = "_id";

/// Collection names
pub mod collections {
    pub const PHARMACIES: &str = "pharmacies";
    pub const MEDICINES: &str = "medicines";
    pub const USERS: &str = "users";
}

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    #[error("Store backend error: {0}")]
    Backend(String),

    #[error("Duplicate value for {0}")]
    Duplicate(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Result of a single-document update
#[derive(Debug, Clone, PartialEq)]
pub struct Updated {
    /// Document as it was before the patch
    pub previous: Document,
    /// Document after the patch
    pub current: Document,
}

/// Persistence operations used by the HTTP handlers
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All documents in `collection`, oldest first
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>>;

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Documents whose top-level `field` equals `value`, oldest first
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Vec<Document>>;

    /// Oldest document whose top-level `field` equals `value`
    async fn find_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Document>>;

    /// Insert `doc`, assigning a fresh `_id`. Returns the stored document.
    async fn insert(&self, collection: &str, doc: Document) -> StoreResult<Document>;

    /// Insert `doc` unless another document in `collection` already holds the
    /// same value for one of `unique_fields`. The check and the write are one
    /// atomic step; a clash fails with `StoreError::Duplicate(field)`.
    async fn insert_unique(
        &self,
        collection: &str,
        doc: Document,
        unique_fields: &[&str],
    ) -> StoreResult<Document>;

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Updated>>;

    /// Patch the oldest document whose `field` equals `value`
    async fn update_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<Option<Updated>>;

    /// Patch every matching document. Returns the number matched.
    async fn update_many_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<u64>;

    /// Remove a document by id, returning it
    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>>;

    /// Remove the oldest matching document, returning it
    async fn delete_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Document>>;

    /// Remove every matching document. Returns the number removed.
    async fn delete_many_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<u64>;

    /// Round-trip check used by health probes
    async fn ping(&self) -> StoreResult<()>;
}

/// Serialize an entity or patch into a document
pub fn to_document<T: Serialize>(value: &T) -> StoreResult<Document> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(StoreError::InvalidDocument(format!(
            "expected a JSON object, got {}",
            other
        ))),
        Err(e) => Err(StoreError::InvalidDocument(e.to_string())),
    }
}

/// Deserialize a stored document into an entity
pub fn from_document<T: DeserializeOwned>(doc: Document) -> StoreResult<T> {
    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::InvalidDocument(e.to_string()))
}

/// Drop the id from a patch so it can never be rewritten
pub(crate) fn sanitize_patch(mut patch: Document) -> Document {
    patch.remove(ID_FIELD);
    patch
}

/// Field equality as the stores understand it: strings compare verbatim,
/// other scalars by their JSON text.
pub(crate) fn field_matches(doc: &Document, field: &str, value: &str) -> bool {
    match doc.get(field) {
        Some(Value::String(s)) => s == value,
        Some(Value::Null) | None => false,
        Some(Value::Object(_)) | Some(Value::Array(_)) => false,
        Some(other) => other.to_string() == value,
    }
}

/// The text a unique field is compared by, if the document sets it
pub(crate) fn unique_value(doc: &Document, field: &str) -> Option<String> {
    match doc.get(field) {
        Some(Value::String(s)) => Some(s.clone()),
        Some(Value::Null) | None => None,
        Some(other) => Some(other.to_string()),
    }
}

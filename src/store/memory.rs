//! In-memory document store
//!
//! Used when no database is configured and as the store behind the
//! integration tests. Collections keep insertion order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{
    field_matches, sanitize_patch, unique_value, Document, DocumentStore, StoreError,
    StoreResult, Updated, ID_FIELD,
};

/// In-memory document store
#[derive(Default)]
pub struct InMemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
    offline: AtomicBool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail with `StoreError::Backend`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of documents in `collection`
    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .read()
            .await
            .get(collection)
            .map(Vec::len)
            .unwrap_or(0)
    }

    fn check_online(&self) -> StoreResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(StoreError::Backend("in-memory store is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

fn id_of(doc: &Document) -> Option<&str> {
    doc.get(ID_FIELD).and_then(Value::as_str)
}

fn apply_patch(doc: &mut Document, patch: &Document) {
    for (key, value) in patch {
        doc.insert(key.clone(), value.clone());
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.check_online()?;
        let collections = self.collections.read().await;
        Ok(collections.get(collection).cloned().unwrap_or_default())
    }

    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.check_online()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| id_of(d) == Some(id)))
            .cloned())
    }

    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Vec<Document>> {
        self.check_online()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| field_matches(d, field, value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn find_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Document>> {
        self.check_online()?;
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| field_matches(d, field, value)))
            .cloned())
    }

    async fn insert(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        self.check_online()?;
        doc.insert(
            ID_FIELD.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );

        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(doc.clone());
        Ok(doc)
    }

    async fn insert_unique(
        &self,
        collection: &str,
        mut doc: Document,
        unique_fields: &[&str],
    ) -> StoreResult<Document> {
        self.check_online()?;
        doc.insert(
            ID_FIELD.to_string(),
            Value::String(Uuid::new_v4().to_string()),
        );

        // Held across the check and the push
        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection.to_string()).or_default();

        for field in unique_fields {
            let Some(value) = unique_value(&doc, field) else {
                continue;
            };
            if docs.iter().any(|d| field_matches(d, field, &value)) {
                return Err(StoreError::Duplicate(field.to_string()));
            }
        }

        docs.push(doc.clone());
        Ok(doc)
    }

    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Updated>> {
        self.check_online()?;
        let patch = sanitize_patch(patch);
        let mut collections = self.collections.write().await;

        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| id_of(d) == Some(id)))
        else {
            return Ok(None);
        };

        let previous = doc.clone();
        apply_patch(doc, &patch);
        Ok(Some(Updated {
            previous,
            current: doc.clone(),
        }))
    }

    async fn update_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<Option<Updated>> {
        self.check_online()?;
        let patch = sanitize_patch(patch);
        let mut collections = self.collections.write().await;

        let Some(doc) = collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| field_matches(d, field, value)))
        else {
            return Ok(None);
        };

        let previous = doc.clone();
        apply_patch(doc, &patch);
        Ok(Some(Updated {
            previous,
            current: doc.clone(),
        }))
    }

    async fn update_many_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<u64> {
        self.check_online()?;
        let patch = sanitize_patch(patch);
        let mut collections = self.collections.write().await;

        let mut matched = 0;
        if let Some(docs) = collections.get_mut(collection) {
            for doc in docs.iter_mut().filter(|d| field_matches(d, field, value)) {
                apply_patch(doc, &patch);
                matched += 1;
            }
        }
        Ok(matched)
    }

    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        self.check_online()?;
        let mut collections = self.collections.write().await;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|d| id_of(d) == Some(id))
            .map(|idx| docs.remove(idx)))
    }

    async fn delete_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Document>> {
        self.check_online()?;
        let mut collections = self.collections.write().await;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(None);
        };
        Ok(docs
            .iter()
            .position(|d| field_matches(d, field, value))
            .map(|idx| docs.remove(idx)))
    }

    async fn delete_many_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<u64> {
        self.check_online()?;
        let mut collections = self.collections.write().await;

        let Some(docs) = collections.get_mut(collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !field_matches(d, field, value));
        Ok((before - docs.len()) as u64)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.check_online()
    }
}

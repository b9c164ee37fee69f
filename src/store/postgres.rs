//! PostgreSQL document store
//!
//! All collections share one JSONB table keyed by `(collection, id)`.
//! Field lookups compare `body ->> field` as text.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use super::{
    sanitize_patch, unique_value, Document, DocumentStore, StoreError, StoreResult, Updated,
    ID_FIELD,
};

const CREATE_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body JSONB NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    PRIMARY KEY (collection, id)
)
"#;

const CREATE_BODY_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS documents_body_idx ON documents USING GIN (body)";

const CREATE_ORDER_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS documents_created_idx ON documents (collection, created_at)";

/// PostgreSQL-backed document store
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect, then create the documents table if it does not exist
    #[instrument(skip(url))]
    pub async fn connect(url: &str, pool_size: u32) -> StoreResult<Self> {
        info!(pool_size, "Creating PostgreSQL connection pool");

        let pool = PgPoolOptions::new()
            .max_connections(pool_size.max(1))
            .acquire_timeout(Duration::from_secs(5))
            .connect(url)
            .await?;

        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> StoreResult<()> {
        for statement in [CREATE_TABLE, CREATE_BODY_INDEX, CREATE_ORDER_INDEX] {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        debug!("Document schema ready");
        Ok(())
    }
}

fn into_document(value: Value) -> StoreResult<Document> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::InvalidDocument(format!(
            "stored body is not an object: {}",
            other
        ))),
    }
}

fn into_documents(rows: Vec<(Value,)>) -> StoreResult<Vec<Document>> {
    rows.into_iter().map(|(body,)| into_document(body)).collect()
}

fn into_updated(row: Option<(Value, Value)>) -> StoreResult<Option<Updated>> {
    row.map(|(previous, current)| {
        Ok(Updated {
            previous: into_document(previous)?,
            current: into_document(current)?,
        })
    })
    .transpose()
}

#[async_trait]
impl DocumentStore for PostgresStore {
    #[instrument(skip(self))]
    async fn find_all(&self, collection: &str) -> StoreResult<Vec<Document>> {
        let rows: Vec<(Value,)> = sqlx::query_as(
            "SELECT body FROM documents WHERE collection = $1 ORDER BY created_at, id",
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        into_documents(rows)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row: Option<(Value,)> =
            sqlx::query_as("SELECT body FROM documents WHERE collection = $1 AND id = $2")
                .bind(collection)
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(body,)| into_document(body)).transpose()
    }

    #[instrument(skip(self))]
    async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Vec<Document>> {
        let rows: Vec<(Value,)> = sqlx::query_as(
            r#"
            SELECT body FROM documents
            WHERE collection = $1 AND body ->> $2 = $3
            ORDER BY created_at, id
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        into_documents(rows)
    }

    #[instrument(skip(self))]
    async fn find_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Document>> {
        let row: Option<(Value,)> = sqlx::query_as(
            r#"
            SELECT body FROM documents
            WHERE collection = $1 AND body ->> $2 = $3
            ORDER BY created_at, id
            LIMIT 1
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(body,)| into_document(body)).transpose()
    }

    #[instrument(skip(self, doc))]
    async fn insert(&self, collection: &str, mut doc: Document) -> StoreResult<Document> {
        let id = Uuid::new_v4().to_string();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let (body,): (Value,) = sqlx::query_as(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) RETURNING body",
        )
        .bind(collection)
        .bind(&id)
        .bind(Value::Object(doc))
        .fetch_one(&self.pool)
        .await?;

        debug!(id = %id, "Inserted document");
        into_document(body)
    }

    #[instrument(skip(self, doc))]
    async fn insert_unique(
        &self,
        collection: &str,
        mut doc: Document,
        unique_fields: &[&str],
    ) -> StoreResult<Document> {
        let id = Uuid::new_v4().to_string();
        doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));

        let mut tx = self.pool.begin().await?;

        // Serializes unique inserts per collection until commit
        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(collection)
            .execute(&mut *tx)
            .await?;

        for field in unique_fields {
            let Some(value) = unique_value(&doc, field) else {
                continue;
            };
            let taken: Option<i32> = sqlx::query_scalar(
                "SELECT 1 FROM documents WHERE collection = $1 AND body ->> $2 = $3 LIMIT 1",
            )
            .bind(collection)
            .bind(*field)
            .bind(&value)
            .fetch_optional(&mut *tx)
            .await?;

            if taken.is_some() {
                return Err(StoreError::Duplicate(field.to_string()));
            }
        }

        let (body,): (Value,) = sqlx::query_as(
            "INSERT INTO documents (collection, id, body) VALUES ($1, $2, $3) RETURNING body",
        )
        .bind(collection)
        .bind(&id)
        .bind(Value::Object(doc))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(id = %id, "Inserted unique document");
        into_document(body)
    }

    #[instrument(skip(self, patch))]
    async fn update_by_id(
        &self,
        collection: &str,
        id: &str,
        patch: Document,
    ) -> StoreResult<Option<Updated>> {
        // The self-join exposes the pre-update row as `old`
        let row: Option<(Value, Value)> = sqlx::query_as(
            r#"
            UPDATE documents d
            SET body = d.body || $3, updated_at = NOW()
            FROM documents old
            WHERE d.collection = $1 AND d.id = $2
              AND old.collection = d.collection AND old.id = d.id
            RETURNING old.body, d.body
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(Value::Object(sanitize_patch(patch)))
        .fetch_optional(&self.pool)
        .await?;

        into_updated(row)
    }

    #[instrument(skip(self, patch))]
    async fn update_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<Option<Updated>> {
        let row: Option<(Value, Value)> = sqlx::query_as(
            r#"
            UPDATE documents d
            SET body = d.body || $4, updated_at = NOW()
            FROM (
                SELECT id, body FROM documents
                WHERE collection = $1 AND body ->> $2 = $3
                ORDER BY created_at, id
                LIMIT 1
                FOR UPDATE
            ) old
            WHERE d.collection = $1 AND d.id = old.id
            RETURNING old.body, d.body
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .bind(Value::Object(sanitize_patch(patch)))
        .fetch_optional(&self.pool)
        .await?;

        into_updated(row)
    }

    #[instrument(skip(self, patch))]
    async fn update_many_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
        patch: Document,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            UPDATE documents
            SET body = body || $4, updated_at = NOW()
            WHERE collection = $1 AND body ->> $2 = $3
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .bind(Value::Object(sanitize_patch(patch)))
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        let row: Option<(Value,)> = sqlx::query_as(
            "DELETE FROM documents WHERE collection = $1 AND id = $2 RETURNING body",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(body,)| into_document(body)).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_one_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Option<Document>> {
        let row: Option<(Value,)> = sqlx::query_as(
            r#"
            DELETE FROM documents
            WHERE collection = $1 AND id = (
                SELECT id FROM documents
                WHERE collection = $1 AND body ->> $2 = $3
                ORDER BY created_at, id
                LIMIT 1
            )
            RETURNING body
            "#,
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|(body,)| into_document(body)).transpose()
    }

    #[instrument(skip(self))]
    async fn delete_many_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<u64> {
        let result = sqlx::query(
            "DELETE FROM documents WHERE collection = $1 AND body ->> $2 = $3",
        )
        .bind(collection)
        .bind(field)
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

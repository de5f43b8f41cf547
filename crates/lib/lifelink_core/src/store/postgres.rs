//! PostgreSQL store backend.
//!
//! Collections share one `documents` table; the JSONB payload is matched
//! with containment (`@>`), which gives the same top-level equality
//! semantics as the in-memory backend. Results come back in insertion
//! order (`inserted_at, id`).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use sqlx::postgres::{PgPool, PgPoolOptions};
use uuid::Uuid;

use super::{Document, FindOptions, ResourceStore, StoreConnector, StoreError};
use crate::uuid::uuidv7;

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

/// Document store over a PostgreSQL connection pool.
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// Connect to the store and run embedded migrations.
    ///
    /// An empty url means the store address was never configured, which is
    /// a [`StoreError::AddressUnset`] rather than a connect failure.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self, StoreError> {
        if url.is_empty() {
            return Err(StoreError::AddressUnset);
        }
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        crate::migrate::migrate(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn insert_error(collection: &str, e: sqlx::Error) -> StoreError {
    match e {
        sqlx::Error::Database(db) if db.code().as_deref() == Some(UNIQUE_VIOLATION) => {
            StoreError::Duplicate(collection.to_string())
        }
        other => StoreError::Db(other),
    }
}

#[async_trait]
impl ResourceStore for PgDocumentStore {
    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError> {
        let rows = sqlx::query_scalar::<_, Value>(
            "SELECT doc FROM documents WHERE collection = $1 AND doc @> $2 \
             ORDER BY inserted_at, id LIMIT $3 OFFSET $4",
        )
        .bind(collection)
        .bind(filter)
        .bind(options.limit.map(|l| l as i64))
        .bind(options.skip.unwrap_or(0) as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Option<Document>, StoreError> {
        let row = sqlx::query_scalar::<_, Value>(
            "SELECT doc FROM documents WHERE collection = $1 AND doc @> $2 \
             ORDER BY inserted_at, id LIMIT 1",
        )
        .bind(collection)
        .bind(filter)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn insert_one(
        &self,
        collection: &str,
        mut document: Document,
    ) -> Result<String, StoreError> {
        let Some(obj) = document.as_object_mut() else {
            return Err(StoreError::InvalidDocument("not a JSON object".into()));
        };
        let provided = obj
            .get("id")
            .map(|v| v.as_str().and_then(|s| Uuid::parse_str(s).ok()));
        let id = match provided {
            Some(Some(id)) => id,
            Some(None) => {
                return Err(StoreError::InvalidDocument("id is not a UUID string".into()));
            }
            None => {
                let id = uuidv7();
                obj.insert("id".into(), json!(id.to_string()));
                id
            }
        };
        sqlx::query("INSERT INTO documents (collection, id, doc) VALUES ($1, $2, $3)")
            .bind(collection)
            .bind(id)
            .bind(&document)
            .execute(&self.pool)
            .await
            .map_err(|e| insert_error(collection, e))?;
        Ok(id.to_string())
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        patch: &Document,
    ) -> Result<u64, StoreError> {
        if !patch.is_object() {
            return Err(StoreError::InvalidDocument("patch is not a JSON object".into()));
        }
        let result = sqlx::query(
            "UPDATE documents SET doc = doc || $3 \
             WHERE id = (SELECT id FROM documents WHERE collection = $1 AND doc @> $2 \
                         ORDER BY inserted_at, id LIMIT 1)",
        )
        .bind(collection)
        .bind(filter)
        .bind(patch)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn delete_one(&self, collection: &str, filter: &Document) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM documents \
             WHERE id = (SELECT id FROM documents WHERE collection = $1 AND doc @> $2 \
                         ORDER BY inserted_at, id LIMIT 1)",
        )
        .bind(collection)
        .bind(filter)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn count_documents(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<u64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM documents WHERE collection = $1 AND doc @> $2",
        )
        .bind(collection)
        .bind(filter)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }
}

/// Connector for the Postgres backend, used by the connection cache.
pub struct PgConnector {
    url: String,
    max_connections: u32,
}

impl PgConnector {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: 5,
        }
    }

    pub fn with_max_connections(mut self, max_connections: u32) -> Self {
        self.max_connections = max_connections;
        self
    }
}

#[async_trait]
impl StoreConnector for PgConnector {
    async fn connect(&self) -> Result<Arc<dyn ResourceStore>, StoreError> {
        let store = PgDocumentStore::connect(&self.url, self.max_connections).await?;
        Ok(Arc::new(store))
    }
}

//! Resource store boundary.
//!
//! The rest of the system talks to the document store exclusively through
//! the [`ResourceStore`] trait: collection-style CRUD with top-level
//! equality filters. Two backends implement it — [`postgres::PgDocumentStore`]
//! for production and [`memory::MemoryStore`] for tests and local
//! development. The single live handle is owned by
//! [`cache::ConnectionCache`].

pub mod cache;
pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// A stored document: always a JSON object carrying its own `"id"` field.
pub type Document = serde_json::Value;

/// Options for `find`: offset/limit pagination.
#[derive(Debug, Clone, Copy, Default)]
pub struct FindOptions {
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindOptions {
    /// Options for 1-based page / page-size pagination.
    pub fn page(page: u64, limit: u64) -> Self {
        Self {
            skip: Some(page.saturating_sub(1) * limit),
            limit: Some(limit),
        }
    }
}

/// Store-level errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store connection string is not configured.
    #[error("resource store address is not configured")]
    AddressUnset,

    /// The store could not be reached.
    #[error("failed to reach resource store: {0}")]
    Connection(String),

    /// A uniqueness constraint rejected the document.
    #[error("duplicate document in collection '{0}'")]
    Duplicate(String),

    /// The document is not a JSON object or carries a malformed id.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("database error: {0}")]
    Db(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Collection-style CRUD over JSON documents.
///
/// Filters are JSON objects matched by top-level field equality. `update_one`
/// merge-patches the first matching document; `delete_one` removes it. Both
/// report how many documents were affected (0 or 1).
#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: FindOptions,
    ) -> Result<Vec<Document>, StoreError>;

    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
    ) -> Result<Option<Document>, StoreError>;

    /// Insert a document, assigning a UUIDv7 `"id"` if absent. Returns the id.
    async fn insert_one(&self, collection: &str, document: Document)
    -> Result<String, StoreError>;

    async fn update_one(
        &self,
        collection: &str,
        filter: &Document,
        patch: &Document,
    ) -> Result<u64, StoreError>;

    async fn delete_one(&self, collection: &str, filter: &Document) -> Result<u64, StoreError>;

    async fn count_documents(&self, collection: &str, filter: &Document)
    -> Result<u64, StoreError>;
}

/// Establishes a fresh store handle. Implemented by [`postgres::PgConnector`]
/// in production; tests supply counting fakes to exercise the cache.
#[async_trait]
pub trait StoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ResourceStore>, StoreError>;
}

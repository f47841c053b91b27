//! Document store — the key-addressed database behind the resume adapter.
//!
//! Documents are whole JSON values addressed by `(collection, key)`. A write
//! replaces the stored document; there is no field-level merge and no
//! cross-document transaction.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod postgres;

pub use memory::MemoryDocumentStore;
pub use postgres::PgDocumentStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Carried in `AppState` as `Arc<dyn DocumentStore>`.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Returns the document at `key`, or `None` when absent.
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError>;

    /// Writes `document` at `key`, replacing whatever was there.
    async fn set(&self, collection: &str, key: &str, document: &Value) -> Result<(), StoreError>;

    /// Removes the document at `key`. Absent keys are a no-op.
    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError>;
}

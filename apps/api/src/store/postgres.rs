use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;

use super::{DocumentStore, StoreError};

/// Postgres-backed document store. Every collection shares the `documents`
/// table; see `db::ensure_schema`.
#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(sqlx::query_scalar::<_, Value>(
            "SELECT data FROM documents WHERE collection = $1 AND key = $2",
        )
        .bind(collection)
        .bind(key)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn set(&self, collection: &str, key: &str, document: &Value) -> Result<(), StoreError> {
        // Last write wins: no version check on conflict.
        sqlx::query(
            r#"
            INSERT INTO documents (collection, key, data, updated_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (collection, key)
            DO UPDATE SET data = EXCLUDED.data, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(collection)
        .bind(key)
        .bind(document)
        .execute(&self.pool)
        .await?;

        debug!("Wrote document {collection}/{key}");
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND key = $2")
            .bind(collection)
            .bind(key)
            .execute(&self.pool)
            .await?;

        debug!(
            "Deleted document {collection}/{key} (rows affected: {})",
            result.rows_affected()
        );
        Ok(())
    }
}

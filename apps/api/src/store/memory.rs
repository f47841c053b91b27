use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{DocumentStore, StoreError};

/// In-process document store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<(String, String), Value>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
        let documents = self.documents.read().await;
        Ok(documents
            .get(&(collection.to_string(), key.to_string()))
            .cloned())
    }

    async fn set(&self, collection: &str, key: &str, document: &Value) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .insert((collection.to_string(), key.to_string()), document.clone());
        Ok(())
    }

    async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
        self.documents
            .write()
            .await
            .remove(&(collection.to_string(), key.to_string()));
        Ok(())
    }
}

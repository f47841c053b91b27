use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::models::resume::{Resume, ResumeContent};
use crate::resumes::ResumeError;
use crate::store::{DocumentStore, StoreError};

pub const COLLECTION: &str = "resumes";

/// Save / get / update / delete of a principal's single resume document.
///
/// Every operation takes the caller's verified uid; the uid is the document
/// key, so callers can only ever reach their own document.
#[derive(Clone)]
pub struct ResumeService {
    store: Arc<dyn DocumentStore>,
}

impl ResumeService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Creates or replaces the caller's resume.
    pub async fn save(&self, uid: &str, content: ResumeContent) -> Result<Resume, ResumeError> {
        let resume = content.stamp(uid, now_millis());
        self.write(uid, &resume).await?;
        info!("Saved resume for {uid}");
        Ok(resume)
    }

    /// Fetches `target_uid`'s resume on behalf of `caller_uid`.
    /// Cross-principal reads are refused before the store is consulted.
    pub async fn get(&self, caller_uid: &str, target_uid: &str) -> Result<Resume, ResumeError> {
        if caller_uid != target_uid {
            return Err(ResumeError::Forbidden);
        }
        self.read(target_uid).await?.ok_or(ResumeError::NotFound)
    }

    /// Replaces an existing resume. Fails when the caller has none yet.
    pub async fn update(&self, uid: &str, content: ResumeContent) -> Result<Resume, ResumeError> {
        let resume = content.stamp(uid, now_millis());

        // No version check: concurrent updates resolve last-write-wins.
        if self.store.get(COLLECTION, uid).await?.is_none() {
            return Err(ResumeError::MissingForUpdate(uid.to_string()));
        }

        self.write(uid, &resume).await?;
        info!("Updated resume for {uid}");
        Ok(resume)
    }

    /// Removes the caller's resume. Deleting nothing succeeds.
    pub async fn delete(&self, uid: &str) -> Result<(), ResumeError> {
        self.store.delete(COLLECTION, uid).await?;
        info!("Deleted resume for {uid}");
        Ok(())
    }

    async fn read(&self, uid: &str) -> Result<Option<Resume>, ResumeError> {
        match self.store.get(COLLECTION, uid).await? {
            Some(doc) => Ok(Some(
                serde_json::from_value(doc).map_err(StoreError::from)?,
            )),
            None => Ok(None),
        }
    }

    async fn write(&self, uid: &str, resume: &Resume) -> Result<(), ResumeError> {
        let doc = serde_json::to_value(resume).map_err(StoreError::from)?;
        self.store.set(COLLECTION, uid, &doc).await?;
        Ok(())
    }
}

fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

// Resume Store Adapter and its HTTP surface.
// One document per principal in the "resumes" collection, keyed by uid.

use thiserror::Error;

use crate::store::StoreError;

pub mod handlers;
pub mod service;

pub use service::ResumeService;

#[derive(Debug, Error)]
pub enum ResumeError {
    #[error("Unauthorized access")]
    Forbidden,

    #[error("Resume not found")]
    NotFound,

    #[error("Resume not found for user: {0}")]
    MissingForUpdate(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

use std::sync::Arc;

use crate::auth::TokenVerifier;
use crate::resumes::ResumeService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Identity verification used by the Auth Gate.
    pub verifier: Arc<dyn TokenVerifier>,
    pub resumes: ResumeService,
}

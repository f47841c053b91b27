//! Auth Gate — bearer-token verification in front of every resume route.
//!
//! Token verification is delegated to a `TokenVerifier`; the gate only knows
//! how to find the token and what to do with the verified principal.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use thiserror::Error;

use crate::errors::AppError;

pub mod firebase;
pub mod middleware;

pub use firebase::FirebaseTokenVerifier;
pub use middleware::require_bearer;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Malformed token: {0}")]
    Malformed(String),

    #[error("Unsupported signing algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("No signing key matches kid {0}")]
    UnknownKey(String),

    #[error("Token rejected: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid claims: {0}")]
    InvalidClaims(&'static str),

    #[error("Signing key fetch failed: {0}")]
    KeyFetch(#[from] reqwest::Error),
}

/// Verifies a raw bearer token and returns the principal identifier it names.
///
/// Carried in `AppState` as `Arc<dyn TokenVerifier>`.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<String, AuthError>;
}

/// The verified identity of the caller, attached to the request by
/// `require_bearer`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal(pub String);

impl Principal {
    pub fn uid(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Principal>()
            .cloned()
            .ok_or_else(|| AppError::Unauthorized(middleware::MISSING_HEADER_MESSAGE.to_string()))
    }
}

#[cfg(test)]
pub mod testing {
    use std::collections::HashMap;

    use super::*;

    /// Accepts a fixed set of tokens, each mapped to a principal.
    #[derive(Default)]
    pub struct StaticTokenVerifier {
        tokens: HashMap<String, String>,
    }

    impl StaticTokenVerifier {
        pub fn with_token(mut self, token: &str, uid: &str) -> Self {
            self.tokens.insert(token.to_string(), uid.to_string());
            self
        }
    }

    #[async_trait]
    impl TokenVerifier for StaticTokenVerifier {
        async fn verify(&self, token: &str) -> Result<String, AuthError> {
            self.tokens
                .get(token)
                .cloned()
                .ok_or(AuthError::InvalidClaims("unknown test token"))
        }
    }
}

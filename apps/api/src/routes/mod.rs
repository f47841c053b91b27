pub mod health;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::auth::require_bearer;
use crate::resumes::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    // Everything under /api/resume sits behind the Auth Gate.
    let resume_api = Router::new()
        .route(
            "/api/resume/save",
            post(handlers::handle_save).get(handlers::handle_get_literal),
        )
        .route(
            "/api/resume/update",
            put(handlers::handle_update).get(handlers::handle_get_literal),
        )
        .route(
            "/api/resume/delete",
            delete(handlers::handle_delete).get(handlers::handle_get_literal),
        )
        .route("/api/resume/:user_id", get(handlers::handle_get))
        .layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .route("/health", get(health::health_handler))
        .merge(resume_api)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{header, Method, Request, StatusCode},
    };
    use chrono::Utc;
    use serde_json::{json, Value};
    use tower::ServiceExt;
    use tower_http::cors::CorsLayer;

    use super::*;
    use crate::auth::testing::StaticTokenVerifier;
    use crate::resumes::ResumeService;
    use crate::store::{DocumentStore, MemoryDocumentStore, StoreError};

    /// Memory store that counts every call, so tests can assert the store
    /// was never reached.
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryDocumentStore,
        calls: AtomicUsize,
    }

    impl CountingStore {
        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl DocumentStore for CountingStore {
        async fn get(&self, collection: &str, key: &str) -> Result<Option<Value>, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get(collection, key).await
        }

        async fn set(&self, collection: &str, key: &str, document: &Value) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.set(collection, key, document).await
        }

        async fn delete(&self, collection: &str, key: &str) -> Result<(), StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(collection, key).await
        }
    }

    fn app() -> (Router, Arc<CountingStore>) {
        let store = Arc::new(CountingStore::default());
        let verifier = StaticTokenVerifier::default()
            .with_token("token-u1", "u1")
            .with_token("token-u2", "u2")
            .with_token("token-save", "save");
        let state = AppState {
            verifier: Arc::new(verifier),
            resumes: ResumeService::new(store.clone()),
        };
        (build_router(state), store)
    }

    fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }

    async fn save_as(app: &Router, token: &str, body: Value) -> (StatusCode, Value) {
        send(app, request(Method::POST, "/api/resume/save", Some(token), Some(body))).await
    }

    #[tokio::test]
    async fn test_save_sets_owner_and_timestamp() {
        let (app, _) = app();
        let before = Utc::now().timestamp_millis();

        let (status, body) = save_as(
            &app,
            "token-u1",
            json!({ "userId": "u2", "personalInfo": { "fullName": "A" }, "skills": ["Go"] }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "u1");
        assert_eq!(body["skills"], json!(["Go"]));
        assert_eq!(body["personalInfo"]["fullName"], "A");
        let updated_at = body["updatedAt"].as_i64().unwrap();
        assert!(updated_at >= before && updated_at <= Utc::now().timestamp_millis());
    }

    #[tokio::test]
    async fn test_get_returns_last_write() {
        let (app, _) = app();
        save_as(&app, "token-u1", json!({ "skills": ["Go"] })).await;
        let (status, updated) = send(
            &app,
            request(
                Method::PUT,
                "/api/resume/update",
                Some("token-u1"),
                Some(json!({ "skills": ["Rust", "Go"], "professionalSummary": "Backend" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, request(Method::GET, "/api/resume/u1", Some("token-u1"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, updated);
        assert_eq!(body["skills"], json!(["Rust", "Go"]));
    }

    #[tokio::test]
    async fn test_cross_principal_get_is_forbidden_without_store_access() {
        let (app, store) = app();
        save_as(&app, "token-u2", json!({ "skills": ["Go"] })).await;
        let calls_before = store.calls();

        let (status, body) = send(&app, request(Method::GET, "/api/resume/u2", Some("token-u1"), None)).await;

        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "Unauthorized access" }));
        assert_eq!(store.calls(), calls_before);
    }

    #[tokio::test]
    async fn test_get_before_save_is_not_found() {
        let (app, _) = app();
        let (status, body) = send(&app, request(Method::GET, "/api/resume/u1", Some("token-u1"), None)).await;

        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Resume not found" }));
    }

    #[tokio::test]
    async fn test_delete_then_get_is_not_found() {
        let (app, _) = app();
        save_as(&app, "token-u1", json!({ "skills": ["Go"] })).await;

        let (status, body) = send(&app, request(Method::DELETE, "/api/resume/delete", Some("token-u1"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "message": "Resume deleted successfully" }));

        let (status, _) = send(&app, request(Method::GET, "/api/resume/u1", Some("token-u1"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_without_resume_succeeds() {
        let (app, _) = app();
        let (status, body) = send(&app, request(Method::DELETE, "/api/resume/delete", Some("token-u1"), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Resume deleted successfully");
    }

    #[tokio::test]
    async fn test_update_without_resume_is_an_error() {
        let (app, store) = app();
        let (status, body) = send(
            &app,
            request(Method::PUT, "/api/resume/update", Some("token-u1"), Some(json!({ "skills": ["Go"] }))),
        )
        .await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Resume not found for user: u1" }));
        assert_eq!(store.inner.len().await, 0);
    }

    #[tokio::test]
    async fn test_missing_authorization_never_reaches_store() {
        let (app, store) = app();
        let requests = vec![
            request(Method::POST, "/api/resume/save", None, Some(json!({ "skills": ["Go"] }))),
            request(Method::GET, "/api/resume/u1", None, None),
            request(Method::PUT, "/api/resume/update", None, Some(json!({}))),
            request(Method::DELETE, "/api/resume/delete", None, None),
        ];

        for req in requests {
            let (status, body) = send(&app, req).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body, json!({ "error": "Missing or invalid Authorization header" }));
        }
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_non_bearer_scheme_rejected() {
        let (app, store) = app();
        let req = Request::builder()
            .method(Method::DELETE)
            .uri("/api/resume/delete")
            .header(header::AUTHORIZATION, "Basic dTE6cGFzcw==")
            .body(Body::empty())
            .unwrap();

        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Missing or invalid Authorization header");
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_unverifiable_token_rejected() {
        let (app, store) = app();
        let (status, body) = send(&app, request(Method::DELETE, "/api/resume/delete", Some("forged"), None)).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({ "error": "Invalid or expired token" }));
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_client_owner_fields_of_wrong_type_are_overwritten() {
        let (app, store) = app();
        let (status, body) = save_as(
            &app,
            "token-u1",
            json!({ "userId": 123, "updatedAt": "x", "skills": ["Go"] }),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "u1");
        assert!(body["updatedAt"].as_i64().is_some());
        assert!(store.inner.get("resumes", "u1").await.unwrap().is_some());

        let (status, _) = send(
            &app,
            request(
                Method::PUT,
                "/api/resume/update",
                Some("token-u1"),
                Some(json!({ "userId": ["u2"], "updatedAt": 1.5 })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_uid_matching_a_literal_segment_reads_own_resume() {
        let (app, _) = app();
        let (status, _) = save_as(&app, "token-save", json!({ "skills": ["Go"] })).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = send(&app, request(Method::GET, "/api/resume/save", Some("token-save"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["userId"], "save");

        let (status, body) = send(&app, request(Method::GET, "/api/resume/delete", Some("token-u1"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, json!({ "error": "Unauthorized access" }));
    }

    #[tokio::test]
    async fn test_options_bypasses_auth_gate() {
        let (app, _) = app();
        let (status, _) = send(&app, request(Method::OPTIONS, "/api/resume/save", None, None)).await;
        assert_ne!(status, StatusCode::UNAUTHORIZED);

        let app = app.layer(CorsLayer::permissive());
        let preflight = Request::builder()
            .method(Method::OPTIONS)
            .uri("/api/resume/update")
            .header(header::ORIGIN, "http://localhost:5173")
            .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PUT")
            .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization,content-type")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(&app, preflight).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_malformed_body_is_bad_request() {
        let (app, store) = app();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/api/resume/save")
            .header(header::AUTHORIZATION, "Bearer token-u1")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{\"skills\": "))
            .unwrap();

        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
        assert_eq!(store.calls(), 0);
    }

    #[tokio::test]
    async fn test_health_is_public() {
        let (app, _) = app();
        let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }
}

//! Axum route handlers for the Resume API.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::Uri,
    Json,
};
use serde_json::{json, Value};

use crate::auth::Principal;
use crate::errors::AppError;
use crate::models::resume::{Resume, ResumeContent};
use crate::state::AppState;

/// POST /api/resume/save
pub async fn handle_save(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<ResumeContent>, JsonRejection>,
) -> Result<Json<Resume>, AppError> {
    let Json(content) = payload.map_err(bad_body)?;
    let saved = state.resumes.save(principal.uid(), content).await?;
    Ok(Json(saved))
}

/// GET /api/resume/:user_id
pub async fn handle_get(
    State(state): State<AppState>,
    principal: Principal,
    Path(user_id): Path<String>,
) -> Result<Json<Resume>, AppError> {
    let resume = state.resumes.get(principal.uid(), &user_id).await?;
    Ok(Json(resume))
}

/// GET /api/resume/{save,update,delete}
///
/// Those literal segments are routed ahead of `:user_id`, so a uid that
/// happens to equal one of them is read back from the path here.
pub async fn handle_get_literal(
    State(state): State<AppState>,
    principal: Principal,
    uri: Uri,
) -> Result<Json<Resume>, AppError> {
    let user_id = uri.path().rsplit('/').next().unwrap_or_default();
    let resume = state.resumes.get(principal.uid(), user_id).await?;
    Ok(Json(resume))
}

/// PUT /api/resume/update
pub async fn handle_update(
    State(state): State<AppState>,
    principal: Principal,
    payload: Result<Json<ResumeContent>, JsonRejection>,
) -> Result<Json<Resume>, AppError> {
    let Json(content) = payload.map_err(bad_body)?;
    let updated = state.resumes.update(principal.uid(), content).await?;
    Ok(Json(updated))
}

/// DELETE /api/resume/delete
pub async fn handle_delete(
    State(state): State<AppState>,
    principal: Principal,
) -> Result<Json<Value>, AppError> {
    state.resumes.delete(principal.uid()).await?;
    Ok(Json(json!({ "message": "Resume deleted successfully" })))
}

fn bad_body(rejection: JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}

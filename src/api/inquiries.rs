//! Contact-form endpoints.
//!
//! Submission is public; reading and pruning the inbox is admin-only.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{AdminOnly, Auth};
use crate::db::{Database, Inquiry};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for contact endpoints.
#[derive(Clone)]
pub struct InquiriesState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(InquiriesState);

pub fn router(state: InquiriesState) -> Router {
    Router::new()
        .route("/", post(submit))
        .route("/", get(list))
        .route("/{uuid}", delete(remove))
        .with_state(state)
}

#[derive(Deserialize)]
struct SubmitRequest {
    name: String,
    email: String,
    message: String,
}

async fn submit(
    State(state): State<InquiriesState>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if payload.name.trim().is_empty()
        || payload.email.trim().is_empty()
        || payload.message.trim().is_empty()
    {
        return Err(ApiError::bad_request("All fields are required"));
    }

    let uuid = uuid::Uuid::new_v4().to_string();
    state
        .db
        .inquiries()
        .create(&uuid, &payload.name, &payload.email, &payload.message)
        .await
        .db_err("Failed to save inquiry")?;

    Ok(StatusCode::CREATED)
}

async fn list(
    State(state): State<InquiriesState>,
    _auth: Auth<AdminOnly>,
) -> Result<Json<Vec<Inquiry>>, ApiError> {
    let inquiries = state
        .db
        .inquiries()
        .list()
        .await
        .db_err("Failed to list inquiries")?;
    Ok(Json(inquiries))
}

async fn remove(
    State(state): State<InquiriesState>,
    _auth: Auth<AdminOnly>,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let deleted = state
        .db
        .inquiries()
        .delete(&uuid)
        .await
        .db_err("Failed to delete inquiry")?;
    if !deleted {
        return Err(ApiError::not_found("Inquiry not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

//! Application endpoints.
//!
//! Students submit and manage their own applications; staff review them.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{AnyRole, Auth, StaffOnly};
use crate::db::{Application, ApplicationForm, ApplicationStatus, Database, Role};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for application endpoints.
#[derive(Clone)]
pub struct ApplicationsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(ApplicationsState);

pub fn router(state: ApplicationsState) -> Router {
    Router::new()
        .route("/", get(list_all))
        .route("/", post(submit))
        .route("/mine", get(list_mine))
        .route("/{uuid}", get(get_application))
        .route("/{uuid}", put(update_application))
        .route("/{uuid}", delete(delete_application))
        .route("/{uuid}/approve", put(approve))
        .route("/{uuid}/reject", put(reject))
        .route("/{uuid}/feedback", put(feedback))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct SubmitRequest {
    scholarship_uuid: String,
    #[serde(flatten)]
    form: ApplicationForm,
}

#[derive(Deserialize)]
struct ListAllQuery {
    status: Option<String>,
}

#[derive(Deserialize)]
struct FeedbackRequest {
    feedback: String,
}

// --- Handlers ---

async fn submit(
    State(state): State<ApplicationsState>,
    auth: Auth<AnyRole>,
    Json(payload): Json<SubmitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&payload.scholarship_uuid)?;
    if payload.form.full_name.trim().is_empty() {
        return Err(ApiError::bad_request("Full name is required"));
    }

    let scholarship = state
        .db
        .scholarships()
        .get_by_uuid(&payload.scholarship_uuid)
        .await
        .db_err("Failed to get scholarship")?
        .ok_or_else(|| ApiError::not_found("Scholarship not found"))?;

    let uuid = uuid::Uuid::new_v4().to_string();
    state
        .db
        .applications()
        .create(&uuid, scholarship.id, auth.user().user_id, &payload.form)
        .await
        .db_err("Failed to submit application")?;

    let application = state
        .db
        .applications()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load submitted application")?
        .ok_or_else(|| ApiError::internal("Submitted application not found"))?;

    Ok((StatusCode::CREATED, Json(application)))
}

async fn list_mine(
    State(state): State<ApplicationsState>,
    auth: Auth<AnyRole>,
) -> Result<Json<Vec<Application>>, ApiError> {
    let applications = state
        .db
        .applications()
        .list_by_user(auth.user().user_id)
        .await
        .db_err("Failed to list applications")?;
    Ok(Json(applications))
}

async fn list_all(
    State(state): State<ApplicationsState>,
    _auth: Auth<StaffOnly>,
    Query(query): Query<ListAllQuery>,
) -> Result<Json<Vec<Application>>, ApiError> {
    let status = match query.status.as_deref() {
        None | Some("") => None,
        Some("pending") => Some(ApplicationStatus::Pending),
        Some("approved") => Some(ApplicationStatus::Approved),
        Some("rejected") => Some(ApplicationStatus::Rejected),
        Some(_) => return Err(ApiError::bad_request("Unknown status filter")),
    };

    let applications = state
        .db
        .applications()
        .list_all(status)
        .await
        .db_err("Failed to list applications")?;
    Ok(Json(applications))
}

/// Load an application the caller may see: its owner, or any staff member.
async fn load_visible(
    state: &ApplicationsState,
    auth: &Auth<AnyRole>,
    uuid: &str,
) -> Result<Application, ApiError> {
    validate_uuid(uuid)?;

    let application = state
        .db
        .applications()
        .get_by_uuid(uuid)
        .await
        .db_err("Failed to get application")?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    let user = auth.user();
    let is_staff = user.role == Role::Moderator || user.role == Role::Admin;
    if application.user_id != user.user_id && !is_staff {
        return Err(ApiError::forbidden("Not your application"));
    }

    Ok(application)
}

async fn get_application(
    State(state): State<ApplicationsState>,
    auth: Auth<AnyRole>,
    Path(uuid): Path<String>,
) -> Result<Json<Application>, ApiError> {
    let application = load_visible(&state, &auth, &uuid).await?;
    Ok(Json(application))
}

/// Owners may edit the form while the application is still pending.
async fn update_application(
    State(state): State<ApplicationsState>,
    auth: Auth<AnyRole>,
    Path(uuid): Path<String>,
    Json(form): Json<ApplicationForm>,
) -> Result<Json<Application>, ApiError> {
    validate_uuid(&uuid)?;

    let application = state
        .db
        .applications()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get application")?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    if application.user_id != auth.user().user_id {
        return Err(ApiError::forbidden("Not your application"));
    }
    if application.status != ApplicationStatus::Pending {
        return Err(ApiError::conflict(
            "Only pending applications can be edited",
        ));
    }

    state
        .db
        .applications()
        .update_form(&uuid, &form)
        .await
        .db_err("Failed to update application")?;

    let application = state
        .db
        .applications()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load updated application")?
        .ok_or_else(|| ApiError::internal("Updated application not found"))?;

    Ok(Json(application))
}

/// Owners may withdraw a pending application. Staff may delete any.
async fn delete_application(
    State(state): State<ApplicationsState>,
    auth: Auth<AnyRole>,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let application = load_visible(&state, &auth, &uuid).await?;

    let user = auth.user();
    if application.user_id == user.user_id
        && user.role == Role::Student
        && application.status != ApplicationStatus::Pending
    {
        return Err(ApiError::conflict(
            "Only pending applications can be withdrawn",
        ));
    }

    state
        .db
        .applications()
        .delete(&uuid)
        .await
        .db_err("Failed to delete application")?;

    Ok(StatusCode::NO_CONTENT)
}

async fn set_status(
    state: &ApplicationsState,
    uuid: &str,
    status: ApplicationStatus,
) -> Result<Json<Application>, ApiError> {
    validate_uuid(uuid)?;

    let updated = state
        .db
        .applications()
        .set_status(uuid, status)
        .await
        .db_err("Failed to update application status")?;
    if !updated {
        return Err(ApiError::not_found("Application not found"));
    }

    let application = state
        .db
        .applications()
        .get_by_uuid(uuid)
        .await
        .db_err("Failed to load application")?
        .ok_or_else(|| ApiError::internal("Application not found after update"))?;

    Ok(Json(application))
}

async fn approve(
    State(state): State<ApplicationsState>,
    _auth: Auth<StaffOnly>,
    Path(uuid): Path<String>,
) -> Result<Json<Application>, ApiError> {
    set_status(&state, &uuid, ApplicationStatus::Approved).await
}

async fn reject(
    State(state): State<ApplicationsState>,
    _auth: Auth<StaffOnly>,
    Path(uuid): Path<String>,
) -> Result<Json<Application>, ApiError> {
    set_status(&state, &uuid, ApplicationStatus::Rejected).await
}

async fn feedback(
    State(state): State<ApplicationsState>,
    _auth: Auth<StaffOnly>,
    Path(uuid): Path<String>,
    Json(payload): Json<FeedbackRequest>,
) -> Result<Json<Application>, ApiError> {
    validate_uuid(&uuid)?;
    if payload.feedback.trim().is_empty() {
        return Err(ApiError::bad_request("Feedback cannot be empty"));
    }

    let updated = state
        .db
        .applications()
        .set_feedback(&uuid, &payload.feedback)
        .await
        .db_err("Failed to save feedback")?;
    if !updated {
        return Err(ApiError::not_found("Application not found"));
    }

    let application = state
        .db
        .applications()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load application")?
        .ok_or_else(|| ApiError::internal("Application not found after update"))?;

    Ok(Json(application))
}

//! Scholarship listing endpoints.
//!
//! Browsing is public. Listing management is admin-only.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{AdminOnly, Auth, OptionalAuth};
use crate::db::{Database, Review, Scholarship, ScholarshipFilter, ScholarshipInput};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for scholarship endpoints.
#[derive(Clone)]
pub struct ScholarshipsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(ScholarshipsState);

pub fn router(state: ScholarshipsState) -> Router {
    Router::new()
        .route("/", get(list_scholarships))
        .route("/", post(create_scholarship))
        .route("/latest", get(latest_scholarships))
        .route("/{uuid}", get(get_scholarship))
        .route("/{uuid}", put(update_scholarship))
        .route("/{uuid}", delete(delete_scholarship))
        .route("/{uuid}/reviews", get(scholarship_reviews))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct ListQuery {
    search: Option<String>,
    category: Option<String>,
    country: Option<String>,
    #[serde(default)]
    page: u32,
    #[serde(default)]
    per_page: u32,
}

#[derive(Serialize)]
struct ListResponse {
    scholarships: Vec<Scholarship>,
    total: i64,
    page: u32,
}

#[derive(Serialize)]
struct DetailResponse {
    #[serde(flatten)]
    scholarship: Scholarship,
    /// Whether the signed-in viewer already applied; false for anonymous
    has_applied: bool,
}

// --- Handlers ---

async fn list_scholarships(
    State(state): State<ScholarshipsState>,
    Query(query): Query<ListQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let filter = ScholarshipFilter {
        search: query.search,
        category: query.category,
        country: query.country,
        page: query.page,
        per_page: query.per_page,
    };

    let (scholarships, total) = state
        .db
        .scholarships()
        .list(&filter)
        .await
        .db_err("Failed to list scholarships")?;

    Ok(Json(ListResponse {
        scholarships,
        total,
        page: filter.page.max(1),
    }))
}

async fn latest_scholarships(
    State(state): State<ScholarshipsState>,
) -> Result<impl IntoResponse, ApiError> {
    let scholarships = state
        .db
        .scholarships()
        .list_latest(6)
        .await
        .db_err("Failed to list latest scholarships")?;
    Ok(Json(scholarships))
}

async fn get_scholarship(
    State(state): State<ScholarshipsState>,
    OptionalAuth(viewer): OptionalAuth,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let scholarship = state
        .db
        .scholarships()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get scholarship")?
        .ok_or_else(|| ApiError::not_found("Scholarship not found"))?;

    let has_applied = match &viewer {
        Some(user) => state
            .db
            .applications()
            .has_applied(scholarship.id, user.user_id)
            .await
            .db_err("Failed to check applications")?,
        None => false,
    };

    Ok(Json(DetailResponse {
        scholarship,
        has_applied,
    }))
}

async fn scholarship_reviews(
    State(state): State<ScholarshipsState>,
    Path(uuid): Path<String>,
) -> Result<Json<Vec<Review>>, ApiError> {
    validate_uuid(&uuid)?;

    let scholarship = state
        .db
        .scholarships()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get scholarship")?
        .ok_or_else(|| ApiError::not_found("Scholarship not found"))?;

    let reviews = state
        .db
        .reviews()
        .list_by_scholarship(scholarship.id)
        .await
        .db_err("Failed to list reviews")?;

    Ok(Json(reviews))
}

fn validate_input(input: &ScholarshipInput) -> Result<(), ApiError> {
    if input.scholarship_name.trim().is_empty() {
        return Err(ApiError::bad_request("Scholarship name is required"));
    }
    if input.university_name.trim().is_empty() {
        return Err(ApiError::bad_request("University name is required"));
    }
    if input.application_fees < 0.0 || input.service_charge < 0.0 {
        return Err(ApiError::bad_request("Fees cannot be negative"));
    }
    Ok(())
}

async fn create_scholarship(
    State(state): State<ScholarshipsState>,
    _auth: Auth<AdminOnly>,
    Json(input): Json<ScholarshipInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_input(&input)?;

    let uuid = uuid::Uuid::new_v4().to_string();
    state
        .db
        .scholarships()
        .create(&uuid, &input)
        .await
        .db_err("Failed to create scholarship")?;

    let scholarship = state
        .db
        .scholarships()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load created scholarship")?
        .ok_or_else(|| ApiError::internal("Created scholarship not found"))?;

    Ok((StatusCode::CREATED, Json(scholarship)))
}

async fn update_scholarship(
    State(state): State<ScholarshipsState>,
    _auth: Auth<AdminOnly>,
    Path(uuid): Path<String>,
    Json(input): Json<ScholarshipInput>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;
    validate_input(&input)?;

    let updated = state
        .db
        .scholarships()
        .update(&uuid, &input)
        .await
        .db_err("Failed to update scholarship")?;
    if !updated {
        return Err(ApiError::not_found("Scholarship not found"));
    }

    let scholarship = state
        .db
        .scholarships()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load updated scholarship")?
        .ok_or_else(|| ApiError::internal("Updated scholarship not found"))?;

    Ok(Json(scholarship))
}

async fn delete_scholarship(
    State(state): State<ScholarshipsState>,
    _auth: Auth<AdminOnly>,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let deleted = state
        .db
        .scholarships()
        .delete(&uuid)
        .await
        .db_err("Failed to delete scholarship")?;
    if !deleted {
        return Err(ApiError::not_found("Scholarship not found"));
    }

    Ok(StatusCode::NO_CONTENT)
}

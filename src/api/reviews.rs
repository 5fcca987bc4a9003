//! Review endpoints.
//!
//! One review per user per scholarship. Owners edit their own; staff can
//! moderate any.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{AnyRole, Auth, StaffOnly};
use crate::db::{Database, Review, Role};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for review endpoints.
#[derive(Clone)]
pub struct ReviewsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(ReviewsState);

pub fn router(state: ReviewsState) -> Router {
    Router::new()
        .route("/", get(list_all))
        .route("/", post(create_review))
        .route("/mine", get(list_mine))
        .route("/{uuid}", put(update_review))
        .route("/{uuid}", delete(delete_review))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct CreateReviewRequest {
    scholarship_uuid: String,
    rating_point: i64,
    review_comment: String,
}

#[derive(Deserialize)]
struct UpdateReviewRequest {
    rating_point: i64,
    review_comment: String,
}

fn validate_rating(rating: i64) -> Result<(), ApiError> {
    if !(1..=5).contains(&rating) {
        return Err(ApiError::bad_request("Rating must be between 1 and 5"));
    }
    Ok(())
}

// --- Handlers ---

async fn create_review(
    State(state): State<ReviewsState>,
    auth: Auth<AnyRole>,
    Json(payload): Json<CreateReviewRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&payload.scholarship_uuid)?;
    validate_rating(payload.rating_point)?;
    if payload.review_comment.trim().is_empty() {
        return Err(ApiError::bad_request("Review comment is required"));
    }

    let scholarship = state
        .db
        .scholarships()
        .get_by_uuid(&payload.scholarship_uuid)
        .await
        .db_err("Failed to get scholarship")?
        .ok_or_else(|| ApiError::not_found("Scholarship not found"))?;

    let uuid = uuid::Uuid::new_v4().to_string();
    let created = state
        .db
        .reviews()
        .create(
            &uuid,
            scholarship.id,
            auth.user().user_id,
            payload.rating_point,
            &payload.review_comment,
        )
        .await;

    if created.is_err() {
        // The unique (scholarship, user) index is the only expected failure
        return Err(ApiError::conflict(
            "You have already reviewed this scholarship",
        ));
    }

    let review = state
        .db
        .reviews()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load created review")?
        .ok_or_else(|| ApiError::internal("Created review not found"))?;

    Ok((StatusCode::CREATED, Json(review)))
}

async fn list_mine(
    State(state): State<ReviewsState>,
    auth: Auth<AnyRole>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = state
        .db
        .reviews()
        .list_by_user(auth.user().user_id)
        .await
        .db_err("Failed to list reviews")?;
    Ok(Json(reviews))
}

async fn list_all(
    State(state): State<ReviewsState>,
    _auth: Auth<StaffOnly>,
) -> Result<Json<Vec<Review>>, ApiError> {
    let reviews = state
        .db
        .reviews()
        .list_all()
        .await
        .db_err("Failed to list reviews")?;
    Ok(Json(reviews))
}

async fn update_review(
    State(state): State<ReviewsState>,
    auth: Auth<AnyRole>,
    Path(uuid): Path<String>,
    Json(payload): Json<UpdateReviewRequest>,
) -> Result<Json<Review>, ApiError> {
    validate_uuid(&uuid)?;
    validate_rating(payload.rating_point)?;

    let review = state
        .db
        .reviews()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get review")?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    if review.user_id != auth.user().user_id {
        return Err(ApiError::forbidden("Not your review"));
    }

    state
        .db
        .reviews()
        .update(&uuid, payload.rating_point, &payload.review_comment)
        .await
        .db_err("Failed to update review")?;

    let review = state
        .db
        .reviews()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load updated review")?
        .ok_or_else(|| ApiError::internal("Updated review not found"))?;

    Ok(Json(review))
}

async fn delete_review(
    State(state): State<ReviewsState>,
    auth: Auth<AnyRole>,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let review = state
        .db
        .reviews()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get review")?
        .ok_or_else(|| ApiError::not_found("Review not found"))?;

    let user = auth.user();
    let is_staff = user.role == Role::Moderator || user.role == Role::Admin;
    if review.user_id != user.user_id && !is_staff {
        return Err(ApiError::forbidden("Not your review"));
    }

    state
        .db
        .reviews()
        .delete(&uuid)
        .await
        .db_err("Failed to delete review")?;

    Ok(StatusCode::NO_CONTENT)
}

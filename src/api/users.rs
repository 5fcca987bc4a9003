//! Profile and user-management endpoints.
//!
//! Everyone can edit their own profile. Listing, role changes and deletion
//! are admin-only.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, patch, put},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{AdminOnly, AnyRole, Auth};
use crate::db::{Database, Profile, ProfileUpdate, Role};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for user endpoints.
#[derive(Clone)]
pub struct UsersState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(UsersState);

pub fn router(state: UsersState) -> Router {
    Router::new()
        .route("/", get(list_users))
        .route("/me", put(update_me))
        .route("/{uuid}/role", patch(set_role))
        .route("/{uuid}", delete(delete_user))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct SetRoleRequest {
    role: String,
}

// --- Handlers ---

async fn list_users(
    State(state): State<UsersState>,
    _auth: Auth<AdminOnly>,
) -> Result<Json<Vec<Profile>>, ApiError> {
    let users = state.db.users().list().await.db_err("Failed to list users")?;
    Ok(Json(users))
}

async fn update_me(
    State(state): State<UsersState>,
    auth: Auth<AnyRole>,
    Json(update): Json<ProfileUpdate>,
) -> Result<Json<Profile>, ApiError> {
    if let Some(name) = &update.name {
        if name.trim().is_empty() {
            return Err(ApiError::bad_request("Name cannot be empty"));
        }
    }

    state
        .db
        .users()
        .update_profile(auth.user().user_id, &update)
        .await
        .db_err("Failed to update profile")?;

    let profile = state
        .db
        .users()
        .get_by_id(auth.user().user_id)
        .await
        .db_err("Failed to load profile")?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(profile))
}

async fn set_role(
    State(state): State<UsersState>,
    auth: Auth<AdminOnly>,
    Path(uuid): Path<String>,
    Json(payload): Json<SetRoleRequest>,
) -> Result<Json<Profile>, ApiError> {
    validate_uuid(&uuid)?;

    // Unknown role names are rejected here, not defaulted
    let role = Role::parse_strict(&payload.role)
        .ok_or_else(|| ApiError::bad_request("Unknown role"))?;

    let target = state
        .db
        .users()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if target.id == auth.user().user_id && role != Role::Admin {
        return Err(ApiError::conflict("Admins cannot demote themselves"));
    }

    state
        .db
        .users()
        .set_role(target.id, role)
        .await
        .db_err("Failed to set role")?;

    let profile = state
        .db
        .users()
        .get_by_id(target.id)
        .await
        .db_err("Failed to load user")?
        .ok_or_else(|| ApiError::internal("User not found after update"))?;

    Ok(Json(profile))
}

async fn delete_user(
    State(state): State<UsersState>,
    auth: Auth<AdminOnly>,
    Path(uuid): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&uuid)?;

    let target = state
        .db
        .users()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get user")?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    if target.id == auth.user().user_id {
        return Err(ApiError::conflict("Admins cannot delete themselves"));
    }

    // Revoke first so deletion also signs the user out everywhere
    state
        .db
        .sessions()
        .delete_all_by_user(target.id)
        .await
        .db_err("Failed to revoke sessions")?;
    state
        .db
        .users()
        .delete(target.id)
        .await
        .db_err("Failed to delete user")?;

    Ok(StatusCode::NO_CONTENT)
}

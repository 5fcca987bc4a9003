//! Identity exchange endpoints.
//!
//! Sign-in happens against the identity provider, which hands the client a
//! short-lived credential. The exchange endpoint swaps that credential for an
//! app session token plus the enriched profile. First exchange provisions the
//! profile with the student role.

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::auth::{AnyRole, Auth, get_bearer_token};
use crate::db::{Database, Profile, Role};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;
use crate::rate_limit::{RateLimitConfig, rate_limit_exchange, rate_limit_register};

/// State for auth endpoints.
#[derive(Clone)]
pub struct AuthState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
    /// Verifies provider credentials; a separate trust domain from `jwt`.
    pub provider_jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(AuthState);

pub fn router(state: AuthState, rate_limit: Arc<RateLimitConfig>) -> Router {
    Router::new()
        .route(
            "/exchange",
            post(exchange).route_layer(middleware::from_fn_with_state(
                rate_limit.clone(),
                rate_limit_exchange,
            )),
        )
        .route(
            "/register",
            post(register).route_layer(middleware::from_fn_with_state(
                rate_limit,
                rate_limit_register,
            )),
        )
        .route("/verify", get(verify))
        .route("/logout", post(logout))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct ExchangeRequest {
    credential: String,
}

#[derive(Serialize)]
struct SessionResponse {
    token: String,
    user: Profile,
}

#[derive(Serialize)]
struct VerifyResponse {
    user: Profile,
}

// --- Handlers ---

/// Exchange a provider credential for a session token and profile.
/// Creates the profile on first exchange.
async fn exchange(
    State(state): State<AuthState>,
    Json(payload): Json<ExchangeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state
        .provider_jwt
        .validate_credential(&payload.credential)
        .credential_err()?;

    let profile = match state
        .db
        .users()
        .get_by_email(&claims.email)
        .await
        .db_err("Failed to look up profile")?
    {
        Some(profile) => profile,
        None => {
            let uuid = uuid::Uuid::new_v4().to_string();
            state
                .db
                .users()
                .create(&uuid, &claims.name, &claims.email, Role::Student)
                .await
                .db_err("Failed to create profile")?;
            state
                .db
                .users()
                .get_by_uuid(&uuid)
                .await
                .db_err("Failed to load created profile")?
                .ok_or_else(|| ApiError::internal("Created profile not found"))?
        }
    };

    issue_session(&state, profile).await
}

/// Register explicitly with a provider credential. Conflicts if the email is
/// already enrolled; otherwise equivalent to a first exchange.
async fn register(
    State(state): State<AuthState>,
    Json(payload): Json<ExchangeRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let claims = state
        .provider_jwt
        .validate_credential(&payload.credential)
        .credential_err()?;

    if state
        .db
        .users()
        .get_by_email(&claims.email)
        .await
        .db_err("Failed to look up profile")?
        .is_some()
    {
        return Err(ApiError::conflict("An account with this email already exists"));
    }

    let uuid = uuid::Uuid::new_v4().to_string();
    state
        .db
        .users()
        .create(&uuid, &claims.name, &claims.email, Role::Student)
        .await
        .db_err("Failed to create profile")?;
    let profile = state
        .db
        .users()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load created profile")?
        .ok_or_else(|| ApiError::internal("Created profile not found"))?;

    let response = issue_session(&state, profile).await?;
    Ok((StatusCode::CREATED, response))
}

async fn issue_session(
    state: &AuthState,
    profile: Profile,
) -> Result<Json<SessionResponse>, ApiError> {
    let result = state
        .jwt
        .generate_session_token(&profile.uuid, &profile.email, profile.role)
        .token_err("Failed to generate session token")?;

    state
        .db
        .sessions()
        .create(&result.jti, profile.id, result.issued_at, result.expires_at)
        .await
        .db_err("Failed to record session")?;

    tracing::info!(email = %profile.email, "session issued");

    Ok(Json(SessionResponse {
        token: result.token,
        user: profile,
    }))
}

/// Return the current profile for a valid session token.
async fn verify(
    State(state): State<AuthState>,
    auth: Auth<AnyRole>,
) -> Result<impl IntoResponse, ApiError> {
    let profile = state
        .db
        .users()
        .get_by_id(auth.user().user_id)
        .await
        .db_err("Failed to load profile")?
        .ok_or_else(|| ApiError::not_found("Profile not found"))?;

    Ok(Json(VerifyResponse { user: profile }))
}

/// Revoke the presented session token. Best effort: always succeeds, even
/// for missing or already-revoked tokens, so sign-out never fails.
async fn logout(State(state): State<AuthState>, headers: HeaderMap) -> impl IntoResponse {
    if let Some(token) = get_bearer_token(&headers) {
        if let Ok(claims) = state.jwt.validate_session_token(token) {
            if let Err(e) = state.db.sessions().delete_by_jti(&claims.jti).await {
                tracing::warn!("Failed to revoke session: {}", e);
            }
        }
    }
    StatusCode::NO_CONTENT
}

//! Axum extractors for authentication and role checks.

use std::marker::PhantomData;

use axum::{
    extract::FromRequestParts,
    http::{HeaderMap, header, request::Parts},
};

use super::errors::{ApiAuthError, AuthErrorKind};
use super::state::HasAuthBackend;
use super::types::AuthenticatedUser;
use crate::db::Role;

/// Pull the bearer token out of the Authorization header.
pub fn get_bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Core authentication logic shared by all extractors.
/// Returns the authenticated user or an error kind.
async fn authenticate_request<S>(
    parts: &Parts,
    state: &S,
) -> Result<AuthenticatedUser, AuthErrorKind>
where
    S: HasAuthBackend + Send + Sync,
{
    let token = get_bearer_token(&parts.headers).ok_or(AuthErrorKind::NotAuthenticated)?;

    let claims = state
        .jwt()
        .validate_session_token(token)
        .map_err(|_| AuthErrorKind::InvalidToken)?;

    // A logged-out token is still a valid JWT; the live session row is the
    // source of truth.
    let session = state
        .db()
        .sessions()
        .get_by_jti(&claims.jti)
        .await
        .map_err(|e| {
            tracing::error!("Failed to check session: {}", e);
            AuthErrorKind::DatabaseError
        })?
        .ok_or(AuthErrorKind::TokenRevoked)?;

    let user = state
        .db()
        .users()
        .get_by_id(session.user_id)
        .await
        .map_err(|e| {
            tracing::error!("Failed to get user: {}", e);
            AuthErrorKind::DatabaseError
        })?
        .ok_or(AuthErrorKind::UserNotFound)?;

    Ok(AuthenticatedUser {
        claims,
        user_id: user.id,
        role: user.role,
    })
}

/// A compile-time list of roles allowed through an `Auth` extractor.
///
/// Every constraint spells out its full member list. There is no role
/// hierarchy: admin passes `AdminOnly` but not `StaffOnly` unless listed.
pub trait RoleConstraint {
    const ALLOWED: &'static [Role];
}

/// Any signed-in user.
pub struct AnyRole;

impl RoleConstraint for AnyRole {
    const ALLOWED: &'static [Role] = &[Role::Student, Role::Moderator, Role::Admin];
}

/// Moderators and admins.
pub struct StaffOnly;

impl RoleConstraint for StaffOnly {
    const ALLOWED: &'static [Role] = &[Role::Moderator, Role::Admin];
}

/// Admins only.
pub struct AdminOnly;

impl RoleConstraint for AdminOnly {
    const ALLOWED: &'static [Role] = &[Role::Admin];
}

/// Extractor for endpoints that require an authenticated user whose role is
/// in the constraint's allow list. Returns JSON errors.
pub struct Auth<C: RoleConstraint = AnyRole>(pub AuthenticatedUser, PhantomData<C>);

impl<C: RoleConstraint> Auth<C> {
    pub fn user(&self) -> &AuthenticatedUser {
        &self.0
    }
}

impl<S, C> FromRequestParts<S> for Auth<C>
where
    S: HasAuthBackend + Send + Sync,
    C: RoleConstraint,
{
    type Rejection = ApiAuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = authenticate_request(parts, state)
            .await
            .map_err(ApiAuthError::new)?;

        if !C::ALLOWED.contains(&user.role) {
            return Err(ApiAuthError::new(AuthErrorKind::InsufficientRole));
        }

        Ok(Auth(user, PhantomData))
    }
}

/// Optional authentication extractor. Never fails; endpoints that serve both
/// signed-in and anonymous visitors use this.
pub struct OptionalAuth(pub Option<AuthenticatedUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: HasAuthBackend + Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(OptionalAuth(authenticate_request(parts, state).await.ok()))
    }
}

//! Authentication user types.

use crate::db::Role;
use crate::jwt::SessionClaims;

/// Authenticated user extracted from a live session token.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// JWT claims from the session token
    pub claims: SessionClaims,
    /// Database user ID
    pub user_id: i64,
    /// Role loaded from the database, not the token. A role change takes
    /// effect on the next request even for tokens minted before it.
    pub role: Role,
}

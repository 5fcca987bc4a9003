//! Bearer-token authentication with role-based access control.
//!
//! Session tokens are JWTs tracked by `jti` in the sessions table so logout
//! revokes them server-side. Role checks are explicit allow lists with no
//! hierarchy.

mod errors;
mod extractors;
mod state;
mod types;

pub use errors::ApiAuthError;
pub use extractors::{
    AdminOnly, AnyRole, Auth, OptionalAuth, RoleConstraint, StaffOnly, get_bearer_token,
};
pub use state::HasAuthBackend;
pub use types::AuthenticatedUser;

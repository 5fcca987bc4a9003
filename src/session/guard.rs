//! Route guarding.
//!
//! Pure decision logic: given the current session state and a screen's role
//! allow-list, say what the shell should do. No hierarchy, no implied
//! permissions; a role passes only if the list names it.

use super::store::SessionState;
use crate::db::Role;

/// What the navigation shell should do for a requested route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session restoration is still running; show nothing yet
    Pending,
    /// Not signed in; go to login and come back here afterwards
    RedirectToLogin { return_to: String },
    /// Signed in but the role is not allowed on this screen
    RedirectToUnauthorized,
    Allow,
}

/// Evaluate a route that requires any signed-in user.
pub fn evaluate_signed_in(state: &SessionState, requested_path: &str) -> GuardDecision {
    evaluate(
        state,
        &[Role::Student, Role::Moderator, Role::Admin],
        requested_path,
    )
}

/// Evaluate a route against its role allow-list.
pub fn evaluate(
    state: &SessionState,
    allowed_roles: &[Role],
    requested_path: &str,
) -> GuardDecision {
    if state.is_loading {
        return GuardDecision::Pending;
    }

    let Some(role) = state.role() else {
        return GuardDecision::RedirectToLogin {
            return_to: requested_path.to_string(),
        };
    };

    if allowed_roles.contains(&role) {
        GuardDecision::Allow
    } else {
        GuardDecision::RedirectToUnauthorized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Profile;

    fn signed_in(role: Role) -> SessionState {
        SessionState {
            profile: Some(Profile {
                id: 1,
                uuid: "uuid-1".into(),
                name: "Alice".into(),
                email: "alice@example.com".into(),
                role,
                country: None,
                phone: None,
                dob: None,
                college: None,
                photo_url: None,
                created_at: "2026-01-01 00:00:00".into(),
            }),
            is_loading: false,
        }
    }

    fn signed_out() -> SessionState {
        SessionState {
            profile: None,
            is_loading: false,
        }
    }

    #[test]
    fn test_loading_is_pending_even_when_signed_in() {
        let mut state = signed_in(Role::Admin);
        state.is_loading = true;
        assert_eq!(
            evaluate(&state, &[Role::Admin], "/dashboard/analytics"),
            GuardDecision::Pending
        );
    }

    #[test]
    fn test_signed_out_redirects_to_login_with_return_path() {
        assert_eq!(
            evaluate(&signed_out(), &[Role::Student], "/dashboard/my-applications"),
            GuardDecision::RedirectToLogin {
                return_to: "/dashboard/my-applications".to_string()
            }
        );
    }

    #[test]
    fn test_allowed_role_passes() {
        assert_eq!(
            evaluate(
                &signed_in(Role::Moderator),
                &[Role::Moderator, Role::Admin],
                "/dashboard/manage-applications"
            ),
            GuardDecision::Allow
        );
    }

    #[test]
    fn test_admin_does_not_pass_student_only_screen() {
        // No hierarchy: the list must name the role
        assert_eq!(
            evaluate(
                &signed_in(Role::Admin),
                &[Role::Student],
                "/dashboard/my-applications"
            ),
            GuardDecision::RedirectToUnauthorized
        );
    }

    #[test]
    fn test_wrong_role_redirects_to_unauthorized_not_login() {
        assert_eq!(
            evaluate(
                &signed_in(Role::Student),
                &[Role::Admin],
                "/dashboard/manage-users"
            ),
            GuardDecision::RedirectToUnauthorized
        );
    }

    #[test]
    fn test_any_signed_in_user_passes_signed_in_routes() {
        for role in [Role::Student, Role::Moderator, Role::Admin] {
            assert_eq!(
                evaluate_signed_in(&signed_in(role), "/dashboard"),
                GuardDecision::Allow
            );
        }
        assert!(matches!(
            evaluate_signed_in(&signed_out(), "/dashboard"),
            GuardDecision::RedirectToLogin { .. }
        ));
    }
}

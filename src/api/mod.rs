mod analytics;
mod applications;
mod auth;
mod error;
mod inquiries;
mod payments;
mod reviews;
mod scholarships;
mod users;

use axum::Router;
use std::sync::Arc;

use crate::db::Database;
use crate::jwt::JwtConfig;
use crate::rate_limit::RateLimitConfig;

pub use auth::AuthState;

/// Create the API router.
pub fn create_api_router(
    db: Database,
    jwt: Arc<JwtConfig>,
    provider_jwt: Arc<JwtConfig>,
    rate_limit: Arc<RateLimitConfig>,
) -> Router {
    let auth_state = auth::AuthState {
        db: db.clone(),
        jwt: jwt.clone(),
        provider_jwt,
    };

    let scholarships_state = scholarships::ScholarshipsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let applications_state = applications::ApplicationsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let reviews_state = reviews::ReviewsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let payments_state = payments::PaymentsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let users_state = users::UsersState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let analytics_state = analytics::AnalyticsState {
        db: db.clone(),
        jwt: jwt.clone(),
    };

    let inquiries_state = inquiries::InquiriesState { db, jwt };

    Router::new()
        .nest("/auth", auth::router(auth_state, rate_limit))
        .nest("/scholarships", scholarships::router(scholarships_state))
        .nest("/applications", applications::router(applications_state))
        .nest("/reviews", reviews::router(reviews_state))
        .nest("/payments", payments::router(payments_state))
        .nest("/users", users::router(users_state))
        .nest("/analytics", analytics::router(analytics_state))
        .nest("/contact", inquiries::router(inquiries_state))
}

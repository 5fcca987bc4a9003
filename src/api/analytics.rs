//! Admin analytics.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt};
use crate::auth::{AdminOnly, Auth};
use crate::db::Database;
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for analytics endpoints.
#[derive(Clone)]
pub struct AnalyticsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(AnalyticsState);

pub fn router(state: AnalyticsState) -> Router {
    Router::new()
        .route("/summary", get(summary))
        .with_state(state)
}

#[derive(Serialize)]
struct RoleCount {
    role: String,
    count: i64,
}

#[derive(Serialize)]
struct UniversityCount {
    university_name: String,
    applications: i64,
}

#[derive(Serialize)]
struct SummaryResponse {
    users_by_role: Vec<RoleCount>,
    scholarships: i64,
    applications: i64,
    reviews: i64,
    total_revenue: f64,
    applications_by_university: Vec<UniversityCount>,
}

async fn summary(
    State(state): State<AnalyticsState>,
    _auth: Auth<AdminOnly>,
) -> Result<Json<SummaryResponse>, ApiError> {
    let users_by_role = state
        .db
        .users()
        .count_by_role()
        .await
        .db_err("Failed to count users")?
        .into_iter()
        .map(|(role, count)| RoleCount { role, count })
        .collect();

    let scholarships = state
        .db
        .scholarships()
        .count()
        .await
        .db_err("Failed to count scholarships")?;
    let applications = state
        .db
        .applications()
        .count()
        .await
        .db_err("Failed to count applications")?;
    let reviews = state
        .db
        .reviews()
        .count()
        .await
        .db_err("Failed to count reviews")?;
    let total_revenue = state
        .db
        .payments()
        .total_revenue()
        .await
        .db_err("Failed to sum revenue")?;

    let applications_by_university = state
        .db
        .applications()
        .count_by_university()
        .await
        .db_err("Failed to count applications by university")?
        .into_iter()
        .map(|(university_name, applications)| UniversityCount {
            university_name,
            applications,
        })
        .collect();

    Ok(Json(SummaryResponse {
        users_by_role,
        scholarships,
        applications,
        reviews,
        total_revenue,
        applications_by_university,
    }))
}

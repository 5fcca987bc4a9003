//! Payment endpoints for application fees.
//!
//! Checkout opens a pending payment priced from the listing's fees. The
//! processor-return hook marks it paid exactly once.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use std::sync::Arc;

use super::error::{ApiError, ResultExt, validate_uuid};
use crate::auth::{AnyRole, Auth};
use crate::db::{Database, Payment, PaymentStatus};
use crate::impl_has_auth_backend;
use crate::jwt::JwtConfig;

/// State for payment endpoints.
#[derive(Clone)]
pub struct PaymentsState {
    pub db: Database,
    pub jwt: Arc<JwtConfig>,
}

impl_has_auth_backend!(PaymentsState);

pub fn router(state: PaymentsState) -> Router {
    Router::new()
        .route("/checkout", post(checkout))
        .route("/mine", get(list_mine))
        .route("/{uuid}/complete", post(complete))
        .with_state(state)
}

// --- Request/Response types ---

#[derive(Deserialize)]
struct CheckoutRequest {
    application_uuid: String,
}

#[derive(Deserialize)]
struct CompleteRequest {
    transaction_id: String,
}

// --- Handlers ---

/// Open a pending payment for one of the caller's applications.
/// Amount is application fees plus service charge from the listing.
async fn checkout(
    State(state): State<PaymentsState>,
    auth: Auth<AnyRole>,
    Json(payload): Json<CheckoutRequest>,
) -> Result<impl IntoResponse, ApiError> {
    validate_uuid(&payload.application_uuid)?;

    let application = state
        .db
        .applications()
        .get_by_uuid(&payload.application_uuid)
        .await
        .db_err("Failed to get application")?
        .ok_or_else(|| ApiError::not_found("Application not found"))?;

    if application.user_id != auth.user().user_id {
        return Err(ApiError::forbidden("Not your application"));
    }

    let scholarship = state
        .db
        .scholarships()
        .get_by_id(application.scholarship_id)
        .await
        .db_err("Failed to get scholarship")?
        .ok_or_else(|| ApiError::internal("Scholarship missing for application"))?;

    let amount = scholarship.application_fees + scholarship.service_charge;

    let uuid = uuid::Uuid::new_v4().to_string();
    state
        .db
        .payments()
        .create(&uuid, application.id, auth.user().user_id, amount)
        .await
        .db_err("Failed to create payment")?;

    let payment = state
        .db
        .payments()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load created payment")?
        .ok_or_else(|| ApiError::internal("Created payment not found"))?;

    Ok((StatusCode::CREATED, Json(payment)))
}

/// Record the processor's completion callback. Idempotence is enforced by
/// the store: a second completion conflicts.
async fn complete(
    State(state): State<PaymentsState>,
    auth: Auth<AnyRole>,
    Path(uuid): Path<String>,
    Json(payload): Json<CompleteRequest>,
) -> Result<Json<Payment>, ApiError> {
    validate_uuid(&uuid)?;
    if payload.transaction_id.trim().is_empty() {
        return Err(ApiError::bad_request("Transaction ID is required"));
    }

    let payment = state
        .db
        .payments()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to get payment")?
        .ok_or_else(|| ApiError::not_found("Payment not found"))?;

    if payment.user_id != auth.user().user_id {
        return Err(ApiError::forbidden("Not your payment"));
    }

    let marked = state
        .db
        .payments()
        .mark_paid(&uuid, &payload.transaction_id)
        .await
        .db_err("Failed to complete payment")?;
    if !marked {
        return Err(ApiError::conflict("Payment is not pending"));
    }

    let payment = state
        .db
        .payments()
        .get_by_uuid(&uuid)
        .await
        .db_err("Failed to load payment")?
        .ok_or_else(|| ApiError::internal("Payment not found after completion"))?;

    debug_assert_eq!(payment.status, PaymentStatus::Paid);
    Ok(Json(payment))
}

async fn list_mine(
    State(state): State<PaymentsState>,
    auth: Auth<AnyRole>,
) -> Result<Json<Vec<Payment>>, ApiError> {
    let payments = state
        .db
        .payments()
        .list_by_user(auth.user().user_id)
        .await
        .db_err("Failed to list payments")?;
    Ok(Json(payments))
}

//! Shared helpers for API integration tests.
//!
//! Tests drive the router directly with `tower::ServiceExt::oneshot` against
//! an in-memory database. Provider credentials are minted with the test
//! provider secret, exactly as the identity provider would.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use scholarstream::{
    ServerConfig, create_app,
    db::{Database, Role},
    jwt::JwtConfig,
    rate_limit::RateLimitConfig,
};
use tower::ServiceExt;

pub const TEST_JWT_SECRET: &[u8] = b"test-jwt-secret";
pub const TEST_PROVIDER_SECRET: &[u8] = b"test-provider-secret";

/// Build an app over a fresh in-memory database. The database handle is
/// returned too, for direct seeding and assertions.
pub async fn create_test_app() -> (Router, Database) {
    let db = Database::open(":memory:")
        .await
        .expect("Failed to open test database");
    let config = ServerConfig {
        db: db.clone(),
        jwt_secret: TEST_JWT_SECRET.to_vec(),
        provider_secret: TEST_PROVIDER_SECRET.to_vec(),
        rate_limit: RateLimitConfig::permissive(),
    };
    (create_app(&config), db)
}

/// Mint a provider credential, as the identity provider would after sign-in.
pub fn mint_credential(email: &str, name: &str) -> String {
    JwtConfig::new(TEST_PROVIDER_SECRET)
        .generate_credential(&format!("uid-{}", email), email, name, true)
        .expect("Failed to mint credential")
}

/// Exchange a credential for a session token. Panics on failure.
pub async fn exchange(app: &Router, email: &str, name: &str) -> String {
    let credential = mint_credential(email, name);
    let (status, json) = post_json(
        app,
        "/auth/exchange",
        None,
        &serde_json::json!({ "credential": credential }),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "exchange failed: {}", json);
    json["token"].as_str().expect("no token in response").to_string()
}

/// Sign in with a given role: exchange first (provisions the profile as a
/// student), then adjust the role directly in the database. Role checks read
/// the database, so the token stays valid.
pub async fn sign_in_as(app: &Router, db: &Database, email: &str, name: &str, role: Role) -> String {
    let token = exchange(app, email, name).await;
    if role != Role::Student {
        let profile = db
            .users()
            .get_by_email(email)
            .await
            .unwrap()
            .expect("profile missing after exchange");
        db.users().set_role(profile.id, role).await.unwrap();
    }
    token
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<String>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    let request = if let Some(body) = body {
        builder
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    } else {
        builder.body(Body::empty()).unwrap()
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        serde_json::Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
    };
    (status, json)
}

pub async fn get(app: &Router, uri: &str, token: Option<&str>) -> (StatusCode, serde_json::Value) {
    send(app, "GET", uri, token, None).await
}

pub async fn post_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, token, Some(body.to_string())).await
}

pub async fn post_empty(
    app: &Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    send(app, "POST", uri, token, None).await
}

pub async fn put_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, token, Some(body.to_string())).await
}

pub async fn put_empty(
    app: &Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    send(app, "PUT", uri, token, None).await
}

pub async fn patch_json(
    app: &Router,
    uri: &str,
    token: Option<&str>,
    body: &serde_json::Value,
) -> (StatusCode, serde_json::Value) {
    send(app, "PATCH", uri, token, Some(body.to_string())).await
}

pub async fn delete(
    app: &Router,
    uri: &str,
    token: Option<&str>,
) -> (StatusCode, serde_json::Value) {
    send(app, "DELETE", uri, token, None).await
}

/// A plausible scholarship payload for create endpoints.
pub fn scholarship_payload(name: &str) -> serde_json::Value {
    serde_json::json!({
        "scholarship_name": name,
        "university_name": "Harvard University",
        "university_country": "USA",
        "university_city": "Cambridge",
        "university_world_rank": 1,
        "subject_category": "Engineering",
        "scholarship_category": "Full fund",
        "degree": "Masters",
        "tuition_fees": 24000.0,
        "application_fees": 75.0,
        "service_charge": 15.0,
        "stipend": 1200.0,
        "application_deadline": "2026-12-31",
        "post_date": "2026-02-01"
    })
}

/// A complete application form payload.
pub fn application_payload(scholarship_uuid: &str) -> serde_json::Value {
    serde_json::json!({
        "scholarship_uuid": scholarship_uuid,
        "full_name": "Alice Walker",
        "phone": "555-0100",
        "dob": "2001-04-12",
        "previous_degree": "BSc",
        "cgpa": "3.8",
        "intake": "Fall 2026",
        "study_gap": null,
        "applied_degree": "Masters",
        "major": "Computer Science",
        "why_university": "Research fit",
        "country": "USA",
        "city": "Cambridge",
        "address": "12 Oak Street",
        "zip": "02138"
    })
}

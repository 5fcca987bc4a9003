mod common;

use axum::http::StatusCode;
use common::*;
use scholarstream::db::Role;

#[tokio::test]
async fn test_browse_is_public() {
    let (app, _db) = create_test_app().await;

    let (status, json) = get(&app, "/scholarships", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 0);
    assert_eq!(json["scholarships"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_admin_creates_scholarship() {
    let (app, db) = create_test_app().await;
    let admin = sign_in_as(&app, &db, "admin@example.com", "Admin", Role::Admin).await;

    let (status, json) = post_json(
        &app,
        "/scholarships",
        Some(&admin),
        &scholarship_payload("Global Merit"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(json["scholarship_name"], "Global Merit");
    assert!(json["uuid"].as_str().is_some());

    let (status, json) = get(&app, "/scholarships", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["total"], 1);
}

#[tokio::test]
async fn test_create_requires_admin() {
    let (app, db) = create_test_app().await;

    let (status, _) = post_json(&app, "/scholarships", None, &scholarship_payload("X")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let student = exchange(&app, "student@example.com", "Student").await;
    let (status, _) = post_json(&app, "/scholarships", Some(&student), &scholarship_payload("X")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Moderators do not manage listings either: no role hierarchy
    let moderator = sign_in_as(&app, &db, "mod@example.com", "Mod", Role::Moderator).await;
    let (status, _) =
        post_json(&app, "/scholarships", Some(&moderator), &scholarship_payload("X")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_create_validates_input() {
    let (app, db) = create_test_app().await;
    let admin = sign_in_as(&app, &db, "admin@example.com", "Admin", Role::Admin).await;

    let mut payload = scholarship_payload("");
    payload["scholarship_name"] = serde_json::json!("   ");
    let (status, _) = post_json(&app, "/scholarships", Some(&admin), &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut payload = scholarship_payload("Negative");
    payload["application_fees"] = serde_json::json!(-1.0);
    let (status, _) = post_json(&app, "/scholarships", Some(&admin), &payload).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_get_update_delete_round_trip() {
    let (app, db) = create_test_app().await;
    let admin = sign_in_as(&app, &db, "admin@example.com", "Admin", Role::Admin).await;

    let (_, created) = post_json(
        &app,
        "/scholarships",
        Some(&admin),
        &scholarship_payload("Global Merit"),
    )
    .await;
    let uuid = created["uuid"].as_str().unwrap();

    let (status, json) = get(&app, &format!("/scholarships/{}", uuid), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["university_name"], "Harvard University");

    let mut update = scholarship_payload("Global Merit Plus");
    update["application_fees"] = serde_json::json!(100.0);
    let (status, json) = put_json(
        &app,
        &format!("/scholarships/{}", uuid),
        Some(&admin),
        &update,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["scholarship_name"], "Global Merit Plus");
    assert_eq!(json["application_fees"], 100.0);

    let (status, _) = delete(&app, &format!("/scholarships/{}", uuid), Some(&admin)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = get(&app, &format!("/scholarships/{}", uuid), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_invalid_uuid_is_bad_request() {
    let (app, _db) = create_test_app().await;

    let (status, _) = get(&app, "/scholarships/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_uuid_is_not_found() {
    let (app, _db) = create_test_app().await;

    let (status, _) = get(
        &app,
        "/scholarships/00000000-0000-4000-8000-000000000000",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_orders_by_deadline_and_paginates() {
    let (app, db) = create_test_app().await;
    let admin = sign_in_as(&app, &db, "admin@example.com", "Admin", Role::Admin).await;

    for (name, deadline) in [
        ("Late", "2026-11-01"),
        ("Early", "2026-03-01"),
        ("Middle", "2026-07-01"),
    ] {
        let mut payload = scholarship_payload(name);
        payload["application_deadline"] = serde_json::json!(deadline);
        post_json(&app, "/scholarships", Some(&admin), &payload).await;
    }

    let (status, json) = get(&app, "/scholarships", None).await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = json["scholarships"]
        .as_array()
        .unwrap()
        .iter()
        .map(|s| s["scholarship_name"].as_str().unwrap())
        .collect();
    assert_eq!(names, ["Early", "Middle", "Late"]);

    let (_, json) = get(&app, "/scholarships?page=2&per_page=2", None).await;
    assert_eq!(json["total"], 3);
    assert_eq!(json["scholarships"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_search_and_country_filters() {
    let (app, db) = create_test_app().await;
    let admin = sign_in_as(&app, &db, "admin@example.com", "Admin", Role::Admin).await;

    let mut canadian = scholarship_payload("Maple Grant");
    canadian["university_country"] = serde_json::json!("Canada");
    post_json(&app, "/scholarships", Some(&admin), &canadian).await;
    post_json(&app, "/scholarships", Some(&admin), &scholarship_payload("Harvard Award")).await;

    let (_, json) = get(&app, "/scholarships?search=Maple", None).await;
    assert_eq!(json["total"], 1);
    assert_eq!(json["scholarships"][0]["scholarship_name"], "Maple Grant");

    let (_, json) = get(&app, "/scholarships?country=Canada", None).await;
    assert_eq!(json["total"], 1);

    let (_, json) = get(&app, "/scholarships?country=Atlantis", None).await;
    assert_eq!(json["total"], 0);
}

#[tokio::test]
async fn test_latest_orders_by_post_date() {
    let (app, db) = create_test_app().await;
    let admin = sign_in_as(&app, &db, "admin@example.com", "Admin", Role::Admin).await;

    for (name, posted) in [("Older", "2026-01-01"), ("Newest", "2026-02-15")] {
        let mut payload = scholarship_payload(name);
        payload["post_date"] = serde_json::json!(posted);
        post_json(&app, "/scholarships", Some(&admin), &payload).await;
    }

    let (status, json) = get(&app, "/scholarships/latest", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json[0]["scholarship_name"], "Newest");
}

#[tokio::test]
async fn test_scholarship_reviews_listing() {
    let (app, db) = create_test_app().await;
    let admin = sign_in_as(&app, &db, "admin@example.com", "Admin", Role::Admin).await;
    let student = exchange(&app, "student@example.com", "Student").await;

    let (_, created) = post_json(
        &app,
        "/scholarships",
        Some(&admin),
        &scholarship_payload("Global Merit"),
    )
    .await;
    let uuid = created["uuid"].as_str().unwrap();

    let (status, json) = get(&app, &format!("/scholarships/{}/reviews", uuid), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json.as_array().unwrap().len(), 0);

    post_json(
        &app,
        "/reviews",
        Some(&student),
        &serde_json::json!({
            "scholarship_uuid": uuid,
            "rating_point": 5,
            "review_comment": "Excellent support"
        }),
    )
    .await;

    let (_, json) = get(&app, &format!("/scholarships/{}/reviews", uuid), None).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["reviewer_name"], "Student");
    assert_eq!(json[0]["rating_point"], 5);
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Admin API tests: access control, moderation actions and exports.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn admin_login(handles: &common::MockHandles) -> String {
    let (cookie, identity) = common::login(handles, "admin@example.sk");
    common::seed_profile(handles, &identity.id, "admin@example.sk", true, false);
    cookie
}

#[tokio::test]
async fn test_admin_api_requires_authentication() {
    let (app, _) = common::create_test_app();

    let response = app
        .oneshot(get("/api/admin/profiles", "access-token=garbage"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_api_rejects_non_admin_session() {
    let (app, handles) = common::create_test_app();
    let (cookie, identity) = common::login(&handles, "jana@example.sk");
    common::seed_profile(&handles, &identity.id, "jana@example.sk", false, false);

    let response = app
        .oneshot(get("/api/admin/profiles", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_api_rejects_session_without_profile() {
    let (app, handles) = common::create_test_app();
    let (cookie, _) = common::login(&handles, "jana@example.sk");

    let response = app
        .oneshot(get("/api/admin/profiles", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_admin_listing_includes_hidden_profiles() {
    let (app, handles) = common::create_test_app();
    let cookie = admin_login(&handles);
    common::seed_profile(&handles, "user-a", "a@example.sk", false, false);
    common::seed_profile(&handles, "user-b", "b@example.sk", false, true);

    let response = app
        .oneshot(get("/api/admin/profiles", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    // Admin's own profile plus the two seeded rows.
    assert_eq!(body["total"], 3);
}

#[tokio::test]
async fn test_admin_can_toggle_visibility() {
    let (app, handles) = common::create_test_app();
    let cookie = admin_login(&handles);
    common::seed_profile(&handles, "user-a", "a@example.sk", false, false);

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/admin/profiles/user-a/hidden")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"hidden": true}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(handles.profiles.get("user-a").unwrap().hidden);
}

#[tokio::test]
async fn test_admin_visibility_toggle_on_unknown_profile_is_404() {
    let (app, handles) = common::create_test_app();
    let cookie = admin_login(&handles);

    let response = app
        .oneshot(
            Request::builder()
                .method("PATCH")
                .uri("/api/admin/profiles/nobody/hidden")
                .header(header::COOKIE, &cookie)
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"hidden": true}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_can_delete_profile() {
    let (app, handles) = common::create_test_app();
    let cookie = admin_login(&handles);
    common::seed_profile(&handles, "user-a", "a@example.sk", false, false);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/admin/profiles/user-a")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!handles.profiles.contains_key("user-a"));
}

#[tokio::test]
async fn test_csv_export_contains_all_profiles() {
    let (app, handles) = common::create_test_app();
    let cookie = admin_login(&handles);
    common::seed_profile(&handles, "user-a", "a@example.sk", false, false);
    common::seed_profile(&handles, "user-b", "b@example.sk", false, true);

    let response = app
        .oneshot(get("/api/admin/export.csv", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert!(response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .contains("ucastnici.csv"));

    let body = common::body_string(response).await;
    assert!(body.starts_with("\"Celé meno\""));
    // Header plus three rows; hidden profiles are included.
    assert_eq!(body.lines().count(), 4);
    assert!(body.contains("b@example.sk"));
}

#[tokio::test]
async fn test_vcard_export_concatenates_cards() {
    let (app, handles) = common::create_test_app();
    let cookie = admin_login(&handles);
    common::seed_profile(&handles, "user-a", "a@example.sk", false, false);

    let response = app
        .oneshot(get("/api/admin/export.vcf", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/vcard; charset=utf-8"
    );

    let body = common::body_string(response).await;
    // Admin's own card plus the seeded one.
    assert_eq!(body.matches("BEGIN:VCARD").count(), 2);
    assert!(body.contains("EMAIL:a@example.sk"));
}

#[tokio::test]
async fn test_export_is_not_reachable_without_admin() {
    let (app, handles) = common::create_test_app();
    let (cookie, identity) = common::login(&handles, "jana@example.sk");
    common::seed_profile(&handles, &identity.id, "jana@example.sk", false, false);

    for uri in ["/api/admin/export.csv", "/api/admin/export.vcf"] {
        let response = app.clone().oneshot(get(uri, &cookie)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "for {uri}");
    }
}

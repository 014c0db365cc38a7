// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Profile API tests: self-service profile management, the attendee
//! directory and photo upload.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

mod common;

fn json_request(method: &str, uri: &str, cookie: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::COOKIE, cookie)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, cookie: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap()
}

fn valid_profile_payload() -> serde_json::Value {
    serde_json::json!({
        "first_name": "Jana",
        "last_name": "Nováková",
        "company": "Acme s.r.o.",
        "position": "CTO",
        "phone": "+421900123456",
        "linkedin_url": "https://linkedin.com/in/jana",
        "agreed_gdpr": true,
    })
}

#[tokio::test]
async fn test_me_before_profile_creation() {
    let (app, handles) = common::create_test_app();
    let (cookie, identity) = common::login(&handles, "jana@example.sk");

    let response = app.oneshot(get("/api/me", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["user"]["user_id"], identity.id);
    assert_eq!(body["user"]["email"], "jana@example.sk");
    assert!(body["profile"].is_null());
}

#[tokio::test]
async fn test_profile_identity_comes_from_session() {
    let (app, handles) = common::create_test_app();
    let (cookie, identity) = common::login(&handles, "jana@example.sk");

    // Payload tries to smuggle a different id and email; both are ignored
    // (they are not even part of the accepted schema).
    let mut payload = valid_profile_payload();
    payload["id"] = serde_json::json!("someone-else");
    payload["email"] = serde_json::json!("attacker@example.sk");

    let response = app
        .oneshot(json_request("POST", "/api/profiles", &cookie, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["id"], identity.id);
    assert_eq!(body["email"], "jana@example.sk");

    let stored = handles.profiles.get(&identity.id).expect("row stored");
    assert_eq!(stored.email, "jana@example.sk");
}

#[tokio::test]
async fn test_profile_resubmit_cannot_clear_admin_flag() {
    let (app, handles) = common::create_test_app();
    let (cookie, identity) = common::login(&handles, "admin@example.sk");
    common::seed_profile(&handles, &identity.id, "admin@example.sk", true, false);

    let response = app
        .oneshot(json_request(
            "POST",
            "/api/profiles",
            &cookie,
            valid_profile_payload(),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stored = handles.profiles.get(&identity.id).unwrap();
    assert!(stored.is_admin);
}

#[tokio::test]
async fn test_profile_requires_gdpr_consent() {
    let (app, handles) = common::create_test_app();
    let (cookie, _) = common::login(&handles, "jana@example.sk");

    let mut payload = valid_profile_payload();
    payload["agreed_gdpr"] = serde_json::json!(false);

    let response = app
        .oneshot(json_request("POST", "/api/profiles", &cookie, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_profile_rejects_invalid_linkedin_url() {
    let (app, handles) = common::create_test_app();
    let (cookie, _) = common::login(&handles, "jana@example.sk");

    let mut payload = valid_profile_payload();
    payload["linkedin_url"] = serde_json::json!("not a url");

    let response = app
        .oneshot(json_request("POST", "/api/profiles", &cookie, payload))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_directory_hides_hidden_profiles() {
    let (app, handles) = common::create_test_app();
    let (cookie, _) = common::login(&handles, "jana@example.sk");
    common::seed_profile(&handles, "user-a", "a@example.sk", false, false);
    common::seed_profile(&handles, "user-b", "b@example.sk", false, true);

    let response = app.oneshot(get("/api/profiles", &cookie)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["profiles"][0]["id"], "user-a");
}

#[tokio::test]
async fn test_directory_search_matches_company() {
    let (app, handles) = common::create_test_app();
    let (cookie, _) = common::login(&handles, "jana@example.sk");

    let mut other = common::seed_profile(&handles, "user-a", "a@example.sk", false, false);
    other.company = Some("Iná firma".to_string());
    handles.profiles.insert("user-a".to_string(), other);
    common::seed_profile(&handles, "user-b", "b@example.sk", false, false);

    let response = app
        .oneshot(get("/api/profiles?q=acme", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = common::body_json(response).await;
    assert_eq!(body["total"], 1);
    assert_eq!(body["profiles"][0]["id"], "user-b");
}

#[tokio::test]
async fn test_hidden_profile_detail_is_not_found() {
    let (app, handles) = common::create_test_app();
    let (cookie, _) = common::login(&handles, "jana@example.sk");
    common::seed_profile(&handles, "user-b", "b@example.sk", false, true);

    let response = app
        .oneshot(get("/api/profiles/user-b", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_vcard_download_for_visible_profile() {
    let (app, handles) = common::create_test_app();
    let (cookie, _) = common::login(&handles, "jana@example.sk");
    common::seed_profile(&handles, "user-a", "a@example.sk", false, false);

    let response = app
        .oneshot(get("/api/profiles/user-a/vcard", &cookie))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "text/vcard; charset=utf-8"
    );
    let disposition = response.headers()[header::CONTENT_DISPOSITION]
        .to_str()
        .unwrap()
        .to_string();
    assert!(disposition.contains(".vcf"));

    let body = common::body_string(response).await;
    assert!(body.starts_with("BEGIN:VCARD"));
    assert!(body.contains("EMAIL:a@example.sk"));
}

#[tokio::test]
async fn test_photo_upload_stores_under_session_user() {
    let (app, handles) = common::create_test_app();
    let (cookie, identity) = common::login(&handles, "jana@example.sk");

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"me.png\"\r\n\
         Content-Type: image/png\r\n\r\n\
         fakepngdata\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(header::COOKIE, &cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let path = body["photo_path"].as_str().unwrap();
    assert!(path.starts_with(&format!("profiles/{}-", identity.id)));
    assert!(path.ends_with(".png"));
    assert!(handles.blobs.contains_key(path));
}

#[tokio::test]
async fn test_photo_upload_filename_cannot_shape_storage_key() {
    let (app, handles) = common::create_test_app();
    let (cookie, identity) = common::login(&handles, "jana@example.sk");

    // Filename tries to smuggle path segments into the blob key.
    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"x.png/../../rest/v1/profiles\"\r\n\
         Content-Type: image/png\r\n\r\n\
         fakepngdata\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(header::COOKIE, &cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = common::body_json(response).await;
    let path = body["photo_path"].as_str().unwrap();

    // Key keeps the `profiles/{userId}-{timestamp}.{ext}` shape; the only
    // slash is the prefix separator and the extension fell back to jpg.
    assert!(path.starts_with(&format!("profiles/{}-", identity.id)));
    assert!(path.ends_with(".jpg"));
    assert_eq!(path.matches('/').count(), 1);
    assert!(!path.contains('?') && !path.contains('#'));
    assert!(handles.blobs.contains_key(path));
}

#[tokio::test]
async fn test_photo_upload_rejects_non_image() {
    let (app, handles) = common::create_test_app();
    let (cookie, _) = common::login(&handles, "jana@example.sk");

    let boundary = "test-boundary";
    let body = format!(
        "--{boundary}\r\n\
         Content-Disposition: form-data; name=\"file\"; filename=\"cv.pdf\"\r\n\
         Content-Type: application/pdf\r\n\r\n\
         %PDF-1.4\r\n\
         --{boundary}--\r\n"
    );

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/upload")
                .header(header::COOKIE, &cookie)
                .header(
                    header::CONTENT_TYPE,
                    format!("multipart/form-data; boundary={boundary}"),
                )
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(handles.blobs.is_empty());
}

#[tokio::test]
async fn test_account_deletion_removes_profile_and_session() {
    let (app, handles) = common::create_test_app();
    let (cookie, identity) = common::login(&handles, "jana@example.sk");
    common::seed_profile(&handles, &identity.id, "jana@example.sk", false, false);

    let response = app
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/account")
                .header(header::COOKIE, &cookie)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(!handles.profiles.contains_key(&identity.id));

    // Session cookies are cleared on the way out.
    let cookies: Vec<String> = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect();
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("access-token=;") && c.contains("Max-Age=0")));
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use vizitka::config::Config;
use vizitka::models::{Identity, Profile};
use vizitka::routes::create_router;
use vizitka::services::{IdentityClient, MockIdentity, PhotoStorage, ProfileStore};
use vizitka::AppState;

/// Handles into the mock backends behind a test app.
pub struct MockHandles {
    pub state: Arc<AppState>,
    pub identity: Arc<MockIdentity>,
    pub profiles: Arc<DashMap<String, Profile>>,
    pub blobs: Arc<DashMap<String, usize>>,
}

/// Create a test app with offline mock dependencies.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, MockHandles) {
    create_test_app_with_public_url("http://localhost:8080")
}

/// Create a test app whose cookie attributes follow the given public URL.
#[allow(dead_code)]
pub fn create_test_app_with_public_url(public_url: &str) -> (axum::Router, MockHandles) {
    let mut config = Config::test_default();
    config.public_url = public_url.to_string();

    let (identity, identity_mock) = IdentityClient::new_mock();
    let (profiles, profile_rows) = ProfileStore::new_mock();
    let (storage, blobs) = PhotoStorage::new_mock();

    let state = Arc::new(AppState {
        config,
        identity,
        profiles,
        storage,
        resend_cooldowns: DashMap::new(),
    });

    (
        create_router(state.clone()),
        MockHandles {
            state,
            identity: identity_mock,
            profiles: profile_rows,
            blobs,
        },
    )
}

/// Seed a provider session for `email` and return a `Cookie` header value
/// carrying the pair, plus the provider-side identity.
#[allow(dead_code)]
pub fn login(handles: &MockHandles, email: &str) -> (String, Identity) {
    let (tokens, identity) = handles.identity.seed_session(email);
    (
        format!(
            "access-token={}; refresh-token={}",
            tokens.access_token, tokens.refresh_token
        ),
        identity,
    )
}

/// Insert a profile row directly into the mock store.
#[allow(dead_code)]
pub fn seed_profile(
    handles: &MockHandles,
    id: &str,
    email: &str,
    is_admin: bool,
    hidden: bool,
) -> Profile {
    let now = Utc::now().to_rfc3339();
    let profile = Profile {
        id: id.to_string(),
        email: email.to_string(),
        first_name: Some("Test".to_string()),
        last_name: Some("User".to_string()),
        company: Some("Acme s.r.o.".to_string()),
        position: Some("Engineer".to_string()),
        phone: None,
        linkedin_url: None,
        about: None,
        photo_path: None,
        hidden,
        is_admin,
        agreed_gdpr: true,
        created_at: now.clone(),
        updated_at: now,
    };
    handles.profiles.insert(id.to_string(), profile.clone());
    profile
}

/// Collect a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .expect("body collects")
        .to_bytes();
    serde_json::from_slice(&bytes).expect("body is JSON")
}

/// Collect a response body as a string.
#[allow(dead_code)]
pub async fn body_string(response: axum::response::Response) -> String {
    let bytes = http_body_util::BodyExt::collect(response.into_body())
        .await
        .expect("body collects")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body is UTF-8")
}

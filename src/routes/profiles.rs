// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Profile API routes for authenticated attendees.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::export::{profile_vcard, vcard_filename};
use crate::models::{Profile, ProfileInput, Session};
use crate::services::PhotoStorage;
use crate::session;
use crate::AppState;

const MAX_PHOTO_BYTES: usize = 5 * 1024 * 1024;
const MAX_PHOTO_EXT_LEN: usize = 8;

/// File extension for the storage key, taken from the client filename.
///
/// The key is interpolated into a service-role-authenticated storage URL, so
/// the extension must never carry path or query characters. Anything that is
/// not a short ASCII-alphanumeric suffix falls back to `jpg`.
fn photo_extension(file_name: &str) -> String {
    let ext = file_name.rsplit('.').next().unwrap_or("");
    if !ext.is_empty()
        && ext.len() <= MAX_PHOTO_EXT_LEN
        && ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        ext.to_ascii_lowercase()
    } else {
        "jpg".to_string()
    }
}

/// Profile routes (require a confirmed session; the guard is applied in
/// routes/mod.rs).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route("/api/profiles", get(list_profiles).post(upsert_profile))
        .route("/api/profiles/{id}", get(get_profile))
        .route("/api/profiles/{id}/vcard", get(download_vcard))
        .route("/api/upload", post(upload_photo))
        .route("/api/account", delete(delete_account))
        // Photo cap is enforced in the handler; the transport limit just
        // needs headroom for the multipart framing.
        .layer(DefaultBodyLimit::max(MAX_PHOTO_BYTES + 64 * 1024))
}

// ─── Current User ────────────────────────────────────────────

#[derive(Serialize)]
pub struct MeResponse {
    pub user: Session,
    /// None until the attendee submits the profile form for the first time
    pub profile: Option<Profile>,
}

/// Current session plus the attendee's own profile.
async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
) -> Result<Json<MeResponse>> {
    let profile = state.profiles.get(&session.user_id).await?;
    Ok(Json(MeResponse {
        user: session,
        profile,
    }))
}

// ─── Profile Upsert ──────────────────────────────────────────

/// Create or update the caller's profile.
///
/// The row key and email always come from the confirmed session; any ids in
/// the payload are ignored. This is the single profile-write path, and the
/// only place the elevated store credential is exercised for attendees.
async fn upsert_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Json(input): Json<ProfileInput>,
) -> Result<Json<Profile>> {
    input
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if !input.agreed_gdpr {
        return Err(AppError::BadRequest(
            "Súhlas so spracovaním údajov je povinný".to_string(),
        ));
    }

    let existing = state.profiles.get(&session.user_id).await?;
    let profile = input.into_profile(&session.user_id, &session.email, existing.as_ref());
    state.profiles.upsert(&profile).await?;

    tracing::info!(user_id = %session.user_id, "Profile saved");
    Ok(Json(profile))
}

// ─── Directory ───────────────────────────────────────────────

#[derive(Deserialize)]
struct DirectoryQuery {
    /// Substring search over name, company and position
    q: Option<String>,
}

#[derive(Serialize)]
pub struct DirectoryResponse {
    pub profiles: Vec<Profile>,
    pub total: usize,
}

/// Visible attendee directory, newest first.
async fn list_profiles(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DirectoryQuery>,
) -> Result<Json<DirectoryResponse>> {
    let profiles = state.profiles.list_visible(params.q.as_deref()).await?;
    let total = profiles.len();
    Ok(Json(DirectoryResponse { profiles, total }))
}

/// A single visible profile.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Profile>> {
    match state.profiles.get(&id).await? {
        Some(profile) if !profile.hidden => Ok(Json(profile)),
        _ => Err(AppError::NotFound(format!("Profile {id}"))),
    }
}

/// Download a contact card for a visible profile.
async fn download_vcard(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Response> {
    let profile = match state.profiles.get(&id).await? {
        Some(profile) if !profile.hidden => profile,
        _ => return Err(AppError::NotFound(format!("Profile {id}"))),
    };

    let body = profile_vcard(&profile);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/vcard; charset=utf-8"),
    );
    let disposition = format!("attachment; filename=\"{}\"", vcard_filename(&profile));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );

    Ok((headers, body).into_response())
}

// ─── Photo Upload ────────────────────────────────────────────

#[derive(Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub photo_path: String,
    pub public_url: String,
}

/// Upload a profile photo to the storage bucket.
///
/// The storage path is derived from the session, never from form fields.
async fn upload_photo(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let mut file: Option<(String, String, Vec<u8>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart payload: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("photo.jpg").to_string();
        let content_type = field
            .content_type()
            .unwrap_or("application/octet-stream")
            .to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Upload read failed: {e}")))?;

        file = Some((file_name, content_type, bytes.to_vec()));
    }

    let Some((file_name, content_type, bytes)) = file else {
        return Err(AppError::BadRequest(
            "Žiadny súbor nebol poskytnutý".to_string(),
        ));
    };

    if !content_type.starts_with("image/") {
        return Err(AppError::BadRequest(
            "Súbor musí byť obrázok (JPG, PNG, GIF, WebP)".to_string(),
        ));
    }
    if bytes.len() > MAX_PHOTO_BYTES {
        return Err(AppError::BadRequest(
            "Súbor je príliš veľký. Maximálna veľkosť je 5MB".to_string(),
        ));
    }

    let extension = photo_extension(&file_name);
    let path = PhotoStorage::photo_path(&session.user_id, &extension);

    state.storage.upload(&path, &content_type, bytes).await?;
    tracing::info!(user_id = %session.user_id, path = %path, "Photo uploaded");

    let public_url = state.storage.public_url(&path);
    Ok(Json(UploadResponse {
        success: true,
        photo_path: path,
        public_url,
    }))
}

// ─── Account Deletion ────────────────────────────────────────

#[derive(Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub message: String,
}

/// Delete the caller's profile and photo, revoke the session and clear the
/// cookies (GDPR removal).
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    jar: CookieJar,
) -> Result<Response> {
    tracing::info!(user_id = %session.user_id, "User-initiated account deletion");

    let photo_path = state.profiles.delete(&session.user_id).await?;
    if let Some(path) = photo_path {
        if let Err(err) = state.storage.delete(&path).await {
            // The profile row is already gone; a dangling blob is not worth
            // failing the whole removal over.
            tracing::warn!(error = %err, path = %path, "Photo deletion failed");
        }
    }

    if let Some(access) = jar.get(session::ACCESS_COOKIE) {
        if let Err(err) = state.identity.sign_out(access.value()).await {
            tracing::warn!(error = %err, "Provider sign-out failed during deletion");
        }
    }

    let jar = session::clear(&state.config, jar);
    Ok((
        jar,
        Json(DeleteAccountResponse {
            success: true,
            message: "Profil bol úspešne odstránený".to_string(),
        }),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::photo_extension;

    #[test]
    fn test_photo_extension_accepts_plain_suffixes() {
        assert_eq!(photo_extension("me.PNG"), "png");
        assert_eq!(photo_extension("photo.jpeg"), "jpeg");
    }

    #[test]
    fn test_photo_extension_rejects_path_and_query_characters() {
        assert_eq!(photo_extension("x.png/../../rest/v1/profiles"), "jpg");
        assert_eq!(photo_extension("x.png?bucket=other"), "jpg");
        assert_eq!(photo_extension("x.png#frag"), "jpg");
        assert_eq!(photo_extension("noextension"), "jpg");
        assert_eq!(photo_extension("trailingdot."), "jpg");
        assert_eq!(photo_extension("x.waytoolongext"), "jpg");
    }
}

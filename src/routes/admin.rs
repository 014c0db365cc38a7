// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Admin API routes.
//!
//! All routes here sit behind the admin guard (session plus `is_admin` on the
//! caller's own profile, re-checked per request in routes/mod.rs).

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
    routing::{delete, get, patch},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::models::export::{profiles_csv, profiles_vcards};
use crate::models::{Profile, Session};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/profiles", get(list_all_profiles))
        .route("/api/admin/profiles/{id}/hidden", patch(set_hidden))
        .route("/api/admin/profiles/{id}", delete(delete_profile))
        .route("/api/admin/export.csv", get(export_csv))
        .route("/api/admin/export.vcf", get(export_vcards))
}

#[derive(Serialize)]
pub struct AdminListResponse {
    pub profiles: Vec<Profile>,
    pub total: usize,
}

/// All profiles, hidden ones included.
async fn list_all_profiles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AdminListResponse>> {
    let profiles = state.profiles.list_all().await?;
    let total = profiles.len();
    Ok(Json(AdminListResponse { profiles, total }))
}

#[derive(Deserialize)]
pub struct SetHiddenRequest {
    pub hidden: bool,
}

#[derive(Serialize)]
pub struct AdminActionResponse {
    pub success: bool,
}

/// Hide or unhide a profile in the directory.
async fn set_hidden(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Json(body): Json<SetHiddenRequest>,
) -> Result<Json<AdminActionResponse>> {
    if state.profiles.get(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Profile {id}")));
    }
    state.profiles.set_hidden(&id, body.hidden).await?;
    tracing::info!(admin = %session.user_id, profile = %id, hidden = body.hidden, "Profile visibility changed");
    Ok(Json(AdminActionResponse { success: true }))
}

/// Remove a profile (and its photo) entirely.
async fn delete_profile(
    State(state): State<Arc<AppState>>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<AdminActionResponse>> {
    if state.profiles.get(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Profile {id}")));
    }
    let photo_path = state.profiles.delete(&id).await?;
    if let Some(path) = photo_path {
        if let Err(err) = state.storage.delete(&path).await {
            tracing::warn!(error = %err, path = %path, "Photo deletion failed");
        }
    }
    tracing::info!(admin = %session.user_id, profile = %id, "Profile deleted by admin");
    Ok(Json(AdminActionResponse { success: true }))
}

fn attachment(content_type: &'static str, filename: &str, body: String) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
    let disposition = format!("attachment; filename=\"{filename}\"");
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .unwrap_or_else(|_| HeaderValue::from_static("attachment")),
    );
    (headers, body).into_response()
}

/// Spreadsheet export of every profile.
async fn export_csv(State(state): State<Arc<AppState>>) -> Result<Response> {
    let profiles = state.profiles.list_all().await?;
    tracing::info!(count = profiles.len(), "CSV export generated");
    Ok(attachment(
        "text/csv; charset=utf-8",
        "ucastnici.csv",
        profiles_csv(&profiles),
    ))
}

/// Bulk contact-card export of every profile.
async fn export_vcards(State(state): State<Arc<AppState>>) -> Result<Response> {
    let profiles = state.profiles.list_all().await?;
    tracing::info!(count = profiles.len(), "vCard export generated");
    Ok(attachment(
        "text/vcard; charset=utf-8",
        "ucastnici.vcf",
        profiles_vcards(&profiles),
    ))
}

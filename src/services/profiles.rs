// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Profile store client (PostgREST-compatible REST API).
//!
//! All writes go through the elevated service-role credential, which bypasses
//! row-level security. Handlers therefore only call this store after the
//! session has been independently confirmed against the identity provider,
//! and always with an id derived from that session.

use crate::error::AppError;
use crate::models::Profile;
use dashmap::DashMap;
use std::sync::Arc;

const TABLE: &str = "profiles";

/// Profile store client.
#[derive(Clone)]
pub struct ProfileStore {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Http {
        http: reqwest::Client,
        base_url: String,
        service_role_key: String,
    },
    Mock(Arc<DashMap<String, Profile>>),
}

impl ProfileStore {
    /// Create a client for the hosted store with a bounded timeout.
    pub fn new(
        base_url: &str,
        service_role_key: &str,
        timeout_secs: u64,
    ) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            backend: Backend::Http {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                service_role_key: service_role_key.to_string(),
            },
        })
    }

    /// Create an in-memory store for testing, plus a handle to seed it.
    pub fn new_mock() -> (Self, Arc<DashMap<String, Profile>>) {
        let rows = Arc::new(DashMap::new());
        (
            Self {
                backend: Backend::Mock(rows.clone()),
            },
            rows,
        )
    }

    /// Get a profile by user id.
    pub async fn get(&self, user_id: &str) -> Result<Option<Profile>, AppError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                service_role_key,
            } => {
                let id_filter = format!("eq.{user_id}");
                let response = http
                    .get(format!("{base_url}/rest/v1/{TABLE}"))
                    .query(&[("select", "*"), ("id", id_filter.as_str())])
                    .header("apikey", service_role_key)
                    .bearer_auth(service_role_key)
                    .send()
                    .await
                    .map_err(store_error)?;

                let mut rows: Vec<Profile> = check_json(response).await?;
                Ok(rows.pop())
            }
            Backend::Mock(rows) => Ok(rows.get(user_id).map(|p| p.clone())),
        }
    }

    /// Create or update a profile (keyed upsert).
    pub async fn upsert(&self, profile: &Profile) -> Result<(), AppError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                service_role_key,
            } => {
                let response = http
                    .post(format!("{base_url}/rest/v1/{TABLE}"))
                    .header("apikey", service_role_key)
                    .bearer_auth(service_role_key)
                    .header("Prefer", "resolution=merge-duplicates,return=minimal")
                    .json(profile)
                    .send()
                    .await
                    .map_err(store_error)?;

                check_status(response).await
            }
            Backend::Mock(rows) => {
                rows.insert(profile.id.clone(), profile.clone());
                Ok(())
            }
        }
    }

    /// List visible profiles, newest first, optionally filtered by a search
    /// query on name/company/position.
    pub async fn list_visible(&self, query: Option<&str>) -> Result<Vec<Profile>, AppError> {
        let mut profiles = match &self.backend {
            Backend::Http {
                http,
                base_url,
                service_role_key,
            } => {
                let response = http
                    .get(format!("{base_url}/rest/v1/{TABLE}"))
                    .query(&[
                        ("select", "*"),
                        ("hidden", "eq.false"),
                        ("order", "created_at.desc"),
                    ])
                    .header("apikey", service_role_key)
                    .bearer_auth(service_role_key)
                    .send()
                    .await
                    .map_err(store_error)?;

                check_json(response).await?
            }
            Backend::Mock(rows) => {
                let mut all: Vec<Profile> = rows
                    .iter()
                    .filter(|entry| !entry.hidden)
                    .map(|entry| entry.clone())
                    .collect();
                all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                all
            }
        };

        if let Some(q) = query {
            let q = q.trim();
            if !q.is_empty() {
                profiles.retain(|p| p.matches_query(q));
            }
        }

        Ok(profiles)
    }

    /// List all profiles including hidden ones (admin view), newest first.
    pub async fn list_all(&self) -> Result<Vec<Profile>, AppError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                service_role_key,
            } => {
                let response = http
                    .get(format!("{base_url}/rest/v1/{TABLE}"))
                    .query(&[("select", "*"), ("order", "created_at.desc")])
                    .header("apikey", service_role_key)
                    .bearer_auth(service_role_key)
                    .send()
                    .await
                    .map_err(store_error)?;

                check_json(response).await
            }
            Backend::Mock(rows) => {
                let mut all: Vec<Profile> = rows.iter().map(|entry| entry.clone()).collect();
                all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
                Ok(all)
            }
        }
    }

    /// Toggle a profile's directory visibility.
    pub async fn set_hidden(&self, user_id: &str, hidden: bool) -> Result<(), AppError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                service_role_key,
            } => {
                let id_filter = format!("eq.{user_id}");
                let response = http
                    .patch(format!("{base_url}/rest/v1/{TABLE}"))
                    .query(&[("id", id_filter.as_str())])
                    .header("apikey", service_role_key)
                    .bearer_auth(service_role_key)
                    .header("Prefer", "return=minimal")
                    .json(&serde_json::json!({
                        "hidden": hidden,
                        "updated_at": chrono::Utc::now().to_rfc3339(),
                    }))
                    .send()
                    .await
                    .map_err(store_error)?;

                check_status(response).await
            }
            Backend::Mock(rows) => {
                let mut entry = rows
                    .get_mut(user_id)
                    .ok_or_else(|| AppError::NotFound(format!("Profile {user_id}")))?;
                entry.hidden = hidden;
                entry.updated_at = chrono::Utc::now().to_rfc3339();
                Ok(())
            }
        }
    }

    /// Delete a profile row. Returns the stored photo path so the caller can
    /// cascade the blob deletion.
    pub async fn delete(&self, user_id: &str) -> Result<Option<String>, AppError> {
        let photo_path = self.get(user_id).await?.and_then(|p| p.photo_path);

        match &self.backend {
            Backend::Http {
                http,
                base_url,
                service_role_key,
            } => {
                let id_filter = format!("eq.{user_id}");
                let response = http
                    .delete(format!("{base_url}/rest/v1/{TABLE}"))
                    .query(&[("id", id_filter.as_str())])
                    .header("apikey", service_role_key)
                    .bearer_auth(service_role_key)
                    .send()
                    .await
                    .map_err(store_error)?;

                check_status(response).await?;
            }
            Backend::Mock(rows) => {
                rows.remove(user_id);
            }
        }

        Ok(photo_path)
    }
}

fn store_error(err: reqwest::Error) -> AppError {
    AppError::Provider(format!("profile store request failed: {err}"))
}

async fn check_status(response: reqwest::Response) -> Result<(), AppError> {
    if response.status().is_success() {
        return Ok(());
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(AppError::Provider(format!(
        "profile store HTTP {status}: {body}"
    )))
}

async fn check_json<T: for<'de> serde::Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Provider(format!(
            "profile store HTTP {status}: {body}"
        )));
    }
    response
        .json()
        .await
        .map_err(|e| AppError::Provider(format!("profile store parse error: {e}")))
}

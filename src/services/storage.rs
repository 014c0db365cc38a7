// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Photo blob storage client (hosted storage bucket).

use crate::error::AppError;
use dashmap::DashMap;
use std::sync::Arc;

const BUCKET: &str = "photos";

/// Storage bucket client for profile photos.
#[derive(Clone)]
pub struct PhotoStorage {
    backend: Backend,
}

#[derive(Clone)]
enum Backend {
    Http {
        http: reqwest::Client,
        base_url: String,
        service_role_key: String,
    },
    /// path -> blob size
    Mock(Arc<DashMap<String, usize>>),
}

impl PhotoStorage {
    /// Create a client for the hosted bucket with a bounded timeout.
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

    /// Create an in-memory bucket for testing, plus a handle to inspect it.
    pub fn new_mock() -> (Self, Arc<DashMap<String, usize>>) {
        let blobs = Arc::new(DashMap::new());
        (
            Self {
                backend: Backend::Mock(blobs.clone()),
            },
            blobs,
        )
    }

    /// Generate the bucket path for a user's photo.
    pub fn photo_path(user_id: &str, extension: &str) -> String {
        format!(
            "profiles/{user_id}-{}.{extension}",
            chrono::Utc::now().timestamp_millis()
        )
    }

    /// Public URL a browser can fetch the photo from.
    pub fn public_url(&self, path: &str) -> String {
        match &self.backend {
            Backend::Http { base_url, .. } => {
                format!("{base_url}/storage/v1/object/public/{BUCKET}/{path}")
            }
            Backend::Mock(_) => format!("mock://{BUCKET}/{path}"),
        }
    }

    /// Upload a photo blob.
    pub async fn upload(
        &self,
        path: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), AppError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                service_role_key,
            } => {
                let response = http
                    .post(format!("{base_url}/storage/v1/object/{BUCKET}/{path}"))
                    .header("apikey", service_role_key)
                    .bearer_auth(service_role_key)
                    .header(reqwest::header::CONTENT_TYPE, content_type)
                    .header(reqwest::header::CACHE_CONTROL, "3600")
                    .body(bytes)
                    .send()
                    .await
                    .map_err(|e| AppError::Provider(format!("photo upload failed: {e}")))?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    Err(AppError::Provider(format!(
                        "photo upload HTTP {status}: {body}"
                    )))
                }
            }
            Backend::Mock(blobs) => {
                blobs.insert(path.to_string(), bytes.len());
                Ok(())
            }
        }
    }

    /// Delete a photo blob. Callers treat failures as non-fatal (the profile
    /// row deletion must not be blocked by a dangling blob).
    pub async fn delete(&self, path: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                service_role_key,
            } => {
                let response = http
                    .delete(format!("{base_url}/storage/v1/object/{BUCKET}/{path}"))
                    .header("apikey", service_role_key)
                    .bearer_auth(service_role_key)
                    .send()
                    .await
                    .map_err(|e| AppError::Provider(format!("photo delete failed: {e}")))?;

                if response.status().is_success() {
                    Ok(())
                } else {
                    let status = response.status();
                    Err(AppError::Provider(format!("photo delete HTTP {status}")))
                }
            }
            Backend::Mock(blobs) => {
                blobs.remove(path);
                Ok(())
            }
        }
    }
}

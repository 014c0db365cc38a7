//! Attendee profile: the stored record and the validated form payload.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Attendee profile stored in the hosted backend, keyed by the provider's
/// user id (1:1 with a session).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    /// User id from the identity provider (also the row key)
    pub id: String,
    pub email: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub company: Option<String>,
    pub position: Option<String>,
    pub phone: Option<String>,
    pub linkedin_url: Option<String>,
    pub about: Option<String>,
    /// Storage path of the profile photo (`profiles/{userId}-{ts}.{ext}`)
    pub photo_path: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub is_admin: bool,
    pub agreed_gdpr: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl Profile {
    /// Display name for exports and cards.
    pub fn full_name(&self) -> String {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.to_string(),
            (None, Some(last)) => last.to_string(),
            (None, None) => self.email.clone(),
        }
    }

    /// Case-insensitive match against a directory search query.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [
            self.first_name.as_deref(),
            self.last_name.as_deref(),
            self.company.as_deref(),
            self.position.as_deref(),
        ]
        .iter()
        .flatten()
        .any(|field| field.to_lowercase().contains(&query))
    }
}

/// Profile form payload submitted by the owning user.
///
/// Identity (id, email) is never taken from this payload; it is always
/// derived from the verified session.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ProfileInput {
    #[validate(length(min = 1, max = 100))]
    pub first_name: Option<String>,
    #[validate(length(min = 1, max = 100))]
    pub last_name: Option<String>,
    #[validate(length(max = 200))]
    pub company: Option<String>,
    #[validate(length(max = 200))]
    pub position: Option<String>,
    #[validate(length(max = 40))]
    pub phone: Option<String>,
    #[validate(url)]
    pub linkedin_url: Option<String>,
    #[validate(length(max = 2000))]
    pub about: Option<String>,
    #[validate(length(max = 300))]
    pub photo_path: Option<String>,
    pub agreed_gdpr: bool,
}

impl ProfileInput {
    /// Build the stored record for the authenticated user, preserving the
    /// fields only the server controls (admin flag, visibility, created_at).
    pub fn into_profile(self, user_id: &str, email: &str, existing: Option<&Profile>) -> Profile {
        let now = Utc::now().to_rfc3339();
        Profile {
            id: user_id.to_string(),
            email: email.to_string(),
            first_name: self.first_name,
            last_name: self.last_name,
            company: self.company,
            position: self.position,
            phone: self.phone,
            linkedin_url: self.linkedin_url,
            about: self.about,
            photo_path: self.photo_path,
            hidden: existing.map(|p| p.hidden).unwrap_or(false),
            is_admin: existing.map(|p| p.is_admin).unwrap_or(false),
            agreed_gdpr: self.agreed_gdpr,
            created_at: existing
                .map(|p| p.created_at.clone())
                .unwrap_or_else(|| now.clone()),
            updated_at: now,
        }
    }
}

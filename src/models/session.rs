//! Session-related types: token pairs and provider identities.

use serde::{Deserialize, Serialize};

/// Access/refresh token pair minted by the identity provider.
///
/// Treated as an opaque bearer credential; this app never inspects or decodes
/// the tokens, it only forwards them back to the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// Unix timestamp of access-token expiry, as reported by the provider
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// The provider's view of an authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub created_at: String,
}

/// A confirmed session, derived by re-querying the provider with a token pair.
///
/// Never constructed from a locally decoded token; see `session::establish`.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user_id: String,
    pub email: String,
    pub created_at: String,
}

impl From<Identity> for Session {
    fn from(identity: Identity) -> Self {
        Self {
            user_id: identity.id,
            email: identity.email,
            created_at: identity.created_at,
        }
    }
}

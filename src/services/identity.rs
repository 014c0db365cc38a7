// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Identity provider client (GoTrue-compatible REST API).
//!
//! Handles:
//! - One-time code issuance and verification
//! - Magic-link code exchange
//! - Identity confirmation for session cookies
//! - Token refresh and sign-out
//!
//! The provider owns codes and tokens entirely; this client treats every
//! token as an opaque bearer credential and never decodes it locally.

use crate::models::{Identity, TokenPair};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// How long a confirmed identity may be served from the in-memory cache.
/// Kept to seconds so revoked sessions are still caught promptly.
const IDENTITY_CACHE_TTL_SECS: i64 = 5;

/// Typed failures from the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("one-time code expired")]
    OtpExpired,

    #[error("one-time code invalid")]
    OtpInvalid,

    #[error("rate limited by provider")]
    RateLimited,

    #[error("access denied")]
    AccessDenied,

    #[error("provider rejected request: {0}")]
    Provider(String),

    #[error("network error: {0}")]
    Network(String),
}

/// Token pair plus the identity the provider attached to it.
#[derive(Debug, Clone)]
pub struct VerifiedSession {
    pub tokens: TokenPair,
    pub identity: Identity,
}

/// A confirmed identity with the time it was fetched from the provider.
#[derive(Clone)]
struct CachedIdentity {
    identity: Identity,
    fetched_at: DateTime<Utc>,
}

/// Identity provider client.
///
/// `new` builds an HTTP client against the hosted provider; `new_mock` builds
/// an in-memory stand-in for tests (codes, sessions and refresh rotation all
/// behave like the hosted service, minus the emails).
#[derive(Clone)]
pub struct IdentityClient {
    backend: Backend,
    /// Short-lived positive cache of confirmed identities, keyed by access
    /// token. TTL is bounded to seconds (see `IDENTITY_CACHE_TTL_SECS`).
    cache: Arc<DashMap<String, CachedIdentity>>,
}

#[derive(Clone)]
enum Backend {
    Http {
        http: reqwest::Client,
        base_url: String,
        anon_key: String,
    },
    Mock(Arc<MockIdentity>),
}

impl IdentityClient {
    /// Create a client for the hosted provider with a bounded timeout.
    pub fn new(base_url: &str, anon_key: &str, timeout_secs: u64) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            backend: Backend::Http {
                http,
                base_url: base_url.trim_end_matches('/').to_string(),
                anon_key: anon_key.to_string(),
            },
            cache: Arc::new(DashMap::new()),
        })
    }

    /// Create a mock client for testing, plus a handle to drive it.
    pub fn new_mock() -> (Self, Arc<MockIdentity>) {
        let mock = Arc::new(MockIdentity::default());
        let client = Self {
            backend: Backend::Mock(mock.clone()),
            cache: Arc::new(DashMap::new()),
        };
        (client, mock)
    }

    // ─── OTP Issuance & Verification ─────────────────────────────

    /// Ask the provider to email a 6-digit one-time code.
    ///
    /// `create_user` selects between "only existing users" and "allow signup";
    /// `captcha_token` is passed through when a human-verification challenge
    /// gates issuance.
    pub async fn request_code(
        &self,
        email: &str,
        create_user: bool,
        captcha_token: Option<&str>,
    ) -> Result<(), IdentityError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                anon_key,
            } => {
                let mut body = serde_json::json!({
                    "email": email,
                    "create_user": create_user,
                });
                if let Some(token) = captcha_token {
                    body["gotrue_meta_security"] = serde_json::json!({ "captcha_token": token });
                }

                let response = http
                    .post(format!("{base_url}/auth/v1/otp"))
                    .header("apikey", anon_key)
                    .json(&body)
                    .send()
                    .await
                    .map_err(request_error)?;

                check_auth_response(response).await?;
                Ok(())
            }
            Backend::Mock(mock) => mock.request_code(email, create_user),
        }
    }

    /// Verify an emailed code. On success the provider invalidates the code
    /// (single use) and mints a token pair.
    pub async fn verify_code(
        &self,
        email: &str,
        code: &str,
    ) -> Result<VerifiedSession, IdentityError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                anon_key,
            } => {
                let response = http
                    .post(format!("{base_url}/auth/v1/verify"))
                    .header("apikey", anon_key)
                    .json(&serde_json::json!({
                        "type": "email",
                        "email": email,
                        "token": code,
                    }))
                    .send()
                    .await
                    .map_err(request_error)?;

                parse_session_response(response).await
            }
            Backend::Mock(mock) => mock.verify_code(email, code),
        }
    }

    /// Exchange a magic-link callback code for a token pair.
    pub async fn exchange_code(&self, code: &str) -> Result<VerifiedSession, IdentityError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                anon_key,
            } => {
                let response = http
                    .post(format!("{base_url}/auth/v1/token?grant_type=pkce"))
                    .header("apikey", anon_key)
                    .json(&serde_json::json!({ "auth_code": code }))
                    .send()
                    .await
                    .map_err(request_error)?;

                parse_session_response(response).await
            }
            Backend::Mock(mock) => mock.exchange_code(code),
        }
    }

    // ─── Identity Confirmation ───────────────────────────────────

    /// Ask the provider who this access token belongs to.
    ///
    /// This is the mandatory confirmation step: a token pair is never trusted
    /// until this call succeeds against the provider.
    pub async fn get_user(&self, access_token: &str) -> Result<Identity, IdentityError> {
        let identity = match &self.backend {
            Backend::Http {
                http,
                base_url,
                anon_key,
            } => {
                let response = http
                    .get(format!("{base_url}/auth/v1/user"))
                    .header("apikey", anon_key)
                    .bearer_auth(access_token)
                    .send()
                    .await
                    .map_err(request_error)?;

                if response.status().as_u16() == 401 || response.status().as_u16() == 403 {
                    return Err(IdentityError::AccessDenied);
                }
                if !response.status().is_success() {
                    return Err(provider_error(response).await);
                }

                response
                    .json::<Identity>()
                    .await
                    .map_err(|e| IdentityError::Provider(format!("identity parse error: {e}")))?
            }
            Backend::Mock(mock) => mock.get_user(access_token)?,
        };

        // Sweep entries past the TTL on insert; rotated-away tokens would
        // otherwise sit in the map until their next (never) lookup.
        let now = Utc::now();
        self.cache
            .retain(|_, cached| now - cached.fetched_at < Duration::seconds(IDENTITY_CACHE_TTL_SECS));
        self.cache.insert(
            access_token.to_string(),
            CachedIdentity {
                identity: identity.clone(),
                fetched_at: now,
            },
        );

        Ok(identity)
    }

    /// Identity check with a seconds-bounded positive cache.
    ///
    /// Used by the route guard, which runs on every request to a protected
    /// path; the tight TTL keeps the revocation guarantee while avoiding one
    /// provider round-trip per asset request in a burst.
    pub async fn get_user_cached(&self, access_token: &str) -> Result<Identity, IdentityError> {
        if let Some(cached) = self.cache.get(access_token) {
            if Utc::now() - cached.fetched_at < Duration::seconds(IDENTITY_CACHE_TTL_SECS) {
                return Ok(cached.identity.clone());
            }
        }
        // Expired or missing; drop the stale entry and re-confirm.
        self.cache.remove(access_token);
        self.get_user(access_token).await
    }

    // ─── Refresh & Sign-out ──────────────────────────────────────

    /// Exchange a refresh token for a fresh pair. The old refresh token is
    /// rotated out by the provider.
    pub async fn refresh(&self, refresh_token: &str) -> Result<VerifiedSession, IdentityError> {
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                anon_key,
            } => {
                let response = http
                    .post(format!("{base_url}/auth/v1/token?grant_type=refresh_token"))
                    .header("apikey", anon_key)
                    .json(&serde_json::json!({ "refresh_token": refresh_token }))
                    .send()
                    .await
                    .map_err(request_error)?;

                parse_session_response(response).await
            }
            Backend::Mock(mock) => mock.refresh(refresh_token),
        }
    }

    /// Revoke the session behind this access token. Best-effort; the cookies
    /// are cleared regardless.
    pub async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        self.cache.remove(access_token);
        match &self.backend {
            Backend::Http {
                http,
                base_url,
                anon_key,
            } => {
                let response = http
                    .post(format!("{base_url}/auth/v1/logout"))
                    .header("apikey", anon_key)
                    .bearer_auth(access_token)
                    .send()
                    .await
                    .map_err(request_error)?;

                check_auth_response(response).await?;
                Ok(())
            }
            Backend::Mock(mock) => {
                mock.sign_out(access_token);
                Ok(())
            }
        }
    }
}

fn request_error(err: reqwest::Error) -> IdentityError {
    if err.is_timeout() || err.is_connect() {
        IdentityError::Network(err.to_string())
    } else {
        IdentityError::Provider(err.to_string())
    }
}

/// Error body shape used by the provider's auth endpoints.
#[derive(Deserialize, Default)]
struct AuthErrorBody {
    #[serde(default)]
    error_code: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Map a failed auth response to a typed error.
async fn auth_error(response: reqwest::Response) -> IdentityError {
    let status = response.status().as_u16();
    let body: AuthErrorBody = response.json().await.unwrap_or_default();
    let message = body
        .msg
        .or(body.error_description)
        .unwrap_or_else(|| format!("HTTP {status}"));

    if status == 429 {
        return IdentityError::RateLimited;
    }

    match body.error_code.as_deref() {
        Some("otp_expired") => IdentityError::OtpExpired,
        Some("otp_disabled") | Some("access_denied") => IdentityError::AccessDenied,
        Some("over_email_send_rate_limit") | Some("over_request_rate_limit") => {
            IdentityError::RateLimited
        }
        _ if message.contains("expired") => IdentityError::OtpExpired,
        _ if message.contains("invalid") || message.contains("Invalid") => {
            IdentityError::OtpInvalid
        }
        _ if status == 401 || status == 403 => IdentityError::AccessDenied,
        _ => IdentityError::Provider(message),
    }
}

async fn check_auth_response(response: reqwest::Response) -> Result<(), IdentityError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(auth_error(response).await)
    }
}

async fn provider_error(response: reqwest::Response) -> IdentityError {
    auth_error(response).await
}

/// Session body returned by verify / token endpoints.
#[derive(Deserialize)]
struct SessionResponse {
    access_token: String,
    refresh_token: String,
    #[serde(default)]
    expires_at: Option<i64>,
    user: Identity,
}

async fn parse_session_response(
    response: reqwest::Response,
) -> Result<VerifiedSession, IdentityError> {
    if !response.status().is_success() {
        return Err(auth_error(response).await);
    }

    let session: SessionResponse = response
        .json()
        .await
        .map_err(|e| IdentityError::Provider(format!("session parse error: {e}")))?;

    Ok(VerifiedSession {
        tokens: TokenPair {
            access_token: session.access_token,
            refresh_token: session.refresh_token,
            expires_at: session.expires_at,
        },
        identity: session.user,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock backend for tests
// ─────────────────────────────────────────────────────────────────────────────

struct MockCode {
    code: String,
    expired: bool,
}

/// In-memory identity provider used by tests.
///
/// Mirrors the hosted provider's contract: codes are single use, refresh
/// tokens rotate, revoked access tokens stop resolving.
#[derive(Default)]
pub struct MockIdentity {
    users: DashMap<String, Identity>,
    codes: DashMap<String, MockCode>,
    callback_codes: DashMap<String, Identity>,
    sessions: DashMap<String, Identity>,
    refresh_tokens: DashMap<String, Identity>,
    counter: AtomicU64,
    outage: AtomicBool,
}

impl MockIdentity {
    /// Register a user the provider already knows about.
    pub fn register_user(&self, email: &str) -> Identity {
        let identity = Identity {
            id: format!("user-{}", self.counter.fetch_add(1, Ordering::Relaxed)),
            email: email.to_string(),
            created_at: Utc::now().to_rfc3339(),
        };
        self.users.insert(email.to_string(), identity.clone());
        identity
    }

    /// The last code issued for an email (what the user would read from mail).
    pub fn last_code(&self, email: &str) -> Option<String> {
        self.codes.get(email).map(|c| c.code.clone())
    }

    /// Mark the outstanding code for an email as expired.
    pub fn expire_code(&self, email: &str) {
        if let Some(mut code) = self.codes.get_mut(email) {
            code.expired = true;
        }
    }

    /// Mint a ready-made session for a registered (or new) user.
    pub fn seed_session(&self, email: &str) -> (TokenPair, Identity) {
        let identity = self
            .users
            .get(email)
            .map(|u| u.clone())
            .unwrap_or_else(|| self.register_user(email));
        (self.mint_tokens(&identity), identity)
    }

    /// Seed a magic-link callback code for a user.
    pub fn seed_callback_code(&self, email: &str) -> String {
        let identity = self
            .users
            .get(email)
            .map(|u| u.clone())
            .unwrap_or_else(|| self.register_user(email));
        let code = format!("cb-{}", self.counter.fetch_add(1, Ordering::Relaxed));
        self.callback_codes.insert(code.clone(), identity);
        code
    }

    /// Revoke an access token (as the provider would after sign-out elsewhere).
    pub fn revoke_access(&self, access_token: &str) {
        self.sessions.remove(access_token);
    }

    /// Simulate a provider outage: every call fails with a network error.
    pub fn set_outage(&self, down: bool) {
        self.outage.store(down, Ordering::Relaxed);
    }

    fn check_outage(&self) -> Result<(), IdentityError> {
        if self.outage.load(Ordering::Relaxed) {
            Err(IdentityError::Network("provider unreachable".to_string()))
        } else {
            Ok(())
        }
    }

    fn mint_tokens(&self, identity: &Identity) -> TokenPair {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        let tokens = TokenPair {
            access_token: format!("access-{n}"),
            refresh_token: format!("refresh-{n}"),
            expires_at: Some((Utc::now() + Duration::hours(1)).timestamp()),
        };
        self.sessions
            .insert(tokens.access_token.clone(), identity.clone());
        self.refresh_tokens
            .insert(tokens.refresh_token.clone(), identity.clone());
        tokens
    }

    fn request_code(&self, email: &str, create_user: bool) -> Result<(), IdentityError> {
        self.check_outage()?;
        if !self.users.contains_key(email) {
            if !create_user {
                return Err(IdentityError::AccessDenied);
            }
            self.register_user(email);
        }
        let code = format!("{:06}", 100_000 + self.counter.fetch_add(1, Ordering::Relaxed) % 900_000);
        self.codes.insert(
            email.to_string(),
            MockCode {
                code,
                expired: false,
            },
        );
        Ok(())
    }

    fn verify_code(&self, email: &str, code: &str) -> Result<VerifiedSession, IdentityError> {
        self.check_outage()?;
        let matches = match self.codes.get(email) {
            Some(outstanding) if outstanding.expired => return Err(IdentityError::OtpExpired),
            Some(outstanding) => outstanding.code == code,
            None => false,
        };
        if !matches {
            return Err(IdentityError::OtpInvalid);
        }

        // Single use: a matching code is consumed on verification.
        self.codes.remove(email);

        let identity = self
            .users
            .get(email)
            .map(|u| u.clone())
            .ok_or(IdentityError::OtpInvalid)?;
        Ok(VerifiedSession {
            tokens: self.mint_tokens(&identity),
            identity,
        })
    }

    fn exchange_code(&self, code: &str) -> Result<VerifiedSession, IdentityError> {
        self.check_outage()?;
        let (_, identity) = self
            .callback_codes
            .remove(code)
            .ok_or(IdentityError::OtpInvalid)?;
        Ok(VerifiedSession {
            tokens: self.mint_tokens(&identity),
            identity,
        })
    }

    fn get_user(&self, access_token: &str) -> Result<Identity, IdentityError> {
        self.check_outage()?;
        self.sessions
            .get(access_token)
            .map(|identity| identity.clone())
            .ok_or(IdentityError::AccessDenied)
    }

    fn refresh(&self, refresh_token: &str) -> Result<VerifiedSession, IdentityError> {
        self.check_outage()?;
        // Rotation: the old refresh token is consumed.
        let (_, identity) = self
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(IdentityError::AccessDenied)?;
        Ok(VerifiedSession {
            tokens: self.mint_tokens(&identity),
            identity,
        })
    }

    fn sign_out(&self, access_token: &str) {
        self.sessions.remove(access_token);
    }
}

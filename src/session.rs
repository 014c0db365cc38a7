// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Session bootstrap: persisting a token pair as cookies and confirming it.
//!
//! The flow is `CodeVerified -> SessionPersisted -> SessionConfirmed`: tokens
//! are written into httpOnly cookies, then the identity provider is re-queried
//! with the new access token. The user counts as logged in only after that
//! independent confirmation succeeds; a pair the provider rejects (e.g.
//! already revoked) leaves no partial session state behind.

use crate::config::Config;
use crate::models::{Session, TokenPair};
use crate::services::{IdentityClient, IdentityError};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;

/// Access-token cookie, short-lived (one evening event plus margin).
pub const ACCESS_COOKIE: &str = "access-token";
/// Refresh-token cookie, lives as long as the provider's refresh token.
pub const REFRESH_COOKIE: &str = "refresh-token";

const ACCESS_MAX_AGE: Duration = Duration::hours(8);
const REFRESH_MAX_AGE: Duration = Duration::days(7);

fn build_cookie(
    name: &'static str,
    value: String,
    max_age: Duration,
    secure: bool,
) -> Cookie<'static> {
    Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .max_age(max_age)
        .build()
}

/// Cookies persisting a token pair.
pub fn session_cookies(config: &Config, tokens: &TokenPair) -> (Cookie<'static>, Cookie<'static>) {
    let secure = config.cookies_secure();
    (
        build_cookie(
            ACCESS_COOKIE,
            tokens.access_token.clone(),
            ACCESS_MAX_AGE,
            secure,
        ),
        build_cookie(
            REFRESH_COOKIE,
            tokens.refresh_token.clone(),
            REFRESH_MAX_AGE,
            secure,
        ),
    )
}

/// Removal cookies matching the attributes the session cookies were set with.
pub fn removal_cookies(config: &Config) -> (Cookie<'static>, Cookie<'static>) {
    let secure = config.cookies_secure();
    (
        build_cookie(ACCESS_COOKIE, String::new(), Duration::ZERO, secure),
        build_cookie(REFRESH_COOKIE, String::new(), Duration::ZERO, secure),
    )
}

/// Persist a token pair as session cookies and confirm it with the provider.
///
/// Returns the updated jar in both outcomes: on success it carries the new
/// session cookies, on failure it carries removals so the route guard can
/// never mistake a rejected pair for an authenticated session. Replaying with
/// the same pair is a plain cookie overwrite (idempotent).
pub async fn establish(
    identity: &IdentityClient,
    config: &Config,
    jar: CookieJar,
    tokens: &TokenPair,
) -> (CookieJar, Result<Session, IdentityError>) {
    // SessionPersisted: hand the pair to the cookie writer.
    let (access, refresh) = session_cookies(config, tokens);
    let jar = jar.add(access).add(refresh);

    // SessionConfirmed: independently re-verify against the provider. The
    // pair being accepted locally is not enough.
    match identity.get_user(&tokens.access_token).await {
        Ok(confirmed) => {
            tracing::info!(user_id = %confirmed.id, email = %confirmed.email, "Session confirmed");
            (jar, Ok(Session::from(confirmed)))
        }
        Err(err) => {
            tracing::warn!(error = %err, "Session confirmation failed, clearing cookies");
            let (access, refresh) = removal_cookies(config);
            (jar.add(access).add(refresh), Err(err))
        }
    }
}

/// Clear the session cookies (logout, account deletion, failed bootstrap).
pub fn clear(config: &Config, jar: CookieJar) -> CookieJar {
    let (access, refresh) = removal_cookies(config);
    jar.add(access).add(refresh)
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Route guard: per-request session enforcement.
//!
//! Every request to a protected path re-confirms the session cookies against
//! the identity provider (with a seconds-bounded cache), so revoked sessions
//! are caught promptly. Any provider error counts as "not authenticated" --
//! the guard fails closed, never open.

use crate::error::AppError;
use crate::models::Session;
use crate::session::{self, ACCESS_COOKIE, REFRESH_COOKIE};
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderValue},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use std::sync::Arc;

/// Outcome of resolving the session cookies on a request.
struct Resolved {
    session: Option<Session>,
    /// Fresh cookies to write back when the guard refreshed the pair in-band.
    refreshed: Option<(Cookie<'static>, Cookie<'static>)>,
}

/// Resolve the session from cookies, confirming against the provider.
///
/// When the access token is rejected but a refresh cookie is present, one
/// refresh attempt is made and the rotated pair is handed back for the
/// response. Concurrent requests may race here; both only ever produce
/// newer-or-equal-validity tokens and the last cookie write wins.
async fn resolve(state: &AppState, jar: &CookieJar) -> Resolved {
    if let Some(access) = jar.get(ACCESS_COOKIE) {
        match state.identity.get_user_cached(access.value()).await {
            Ok(identity) => {
                return Resolved {
                    session: Some(Session::from(identity)),
                    refreshed: None,
                }
            }
            Err(err) => {
                tracing::debug!(error = %err, "Access token rejected, trying refresh");
            }
        }
    }

    if let Some(refresh) = jar.get(REFRESH_COOKIE) {
        match state.identity.refresh(refresh.value()).await {
            // The refresh response carries the provider's own view of the
            // user, so it doubles as the identity confirmation.
            Ok(verified) => {
                tracing::debug!(user_id = %verified.identity.id, "Session refreshed in-band");
                return Resolved {
                    session: Some(Session::from(verified.identity)),
                    refreshed: Some(session::session_cookies(&state.config, &verified.tokens)),
                };
            }
            Err(err) => {
                tracing::debug!(error = %err, "Refresh failed, treating as unauthenticated");
            }
        }
    }

    Resolved {
        session: None,
        refreshed: None,
    }
}

/// Append rotated session cookies to an outgoing response.
fn append_refreshed(response: &mut Response, refreshed: Option<(Cookie<'static>, Cookie<'static>)>) {
    if let Some((access, refresh)) = refreshed {
        for cookie in [access, refresh] {
            if let Ok(value) = HeaderValue::from_str(&cookie.to_string()) {
                response.headers_mut().append(header::SET_COOKIE, value);
            }
        }
    }
}

/// Guard for protected pages: redirect to `/login` when unauthenticated.
pub async fn require_session_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve(&state, &jar).await;
    let Some(session) = resolved.session else {
        return Redirect::to("/login").into_response();
    };

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;
    append_refreshed(&mut response, resolved.refreshed);
    response
}

/// Guard for API routes: 401 when unauthenticated.
pub async fn require_session_api(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve(&state, &jar).await;
    let Some(session) = resolved.session else {
        return AppError::Unauthorized.into_response();
    };

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;
    append_refreshed(&mut response, resolved.refreshed);
    response
}

/// Guard for admin API routes: authentication plus the admin flag, checked
/// before any handler runs.
pub async fn require_admin_api(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve(&state, &jar).await;
    let Some(session) = resolved.session else {
        return AppError::Unauthorized.into_response();
    };

    match state.profiles.get(&session.user_id).await {
        Ok(Some(profile)) if profile.is_admin => {}
        Ok(_) => return AppError::Forbidden.into_response(),
        Err(err) => return err.into_response(),
    }

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;
    append_refreshed(&mut response, resolved.refreshed);
    response
}

/// Guard for the admin page: unauthenticated users go to `/login`,
/// authenticated non-admins back to `/app`.
pub async fn require_admin_page(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let resolved = resolve(&state, &jar).await;
    let Some(session) = resolved.session else {
        return Redirect::to("/login").into_response();
    };

    let is_admin = matches!(
        state.profiles.get(&session.user_id).await,
        Ok(Some(profile)) if profile.is_admin
    );
    if !is_admin {
        return Redirect::to("/app").into_response();
    }

    request.extensions_mut().insert(session);
    let mut response = next.run(request).await;
    append_refreshed(&mut response, resolved.refreshed);
    response
}

/// Login page companion: an already-authenticated visitor is sent to `/app`.
pub async fn redirect_if_authenticated(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    let resolved = resolve(&state, &jar).await;
    if resolved.session.is_some() {
        let mut response = Redirect::to("/app").into_response();
        append_refreshed(&mut response, resolved.refreshed);
        return response;
    }
    next.run(request).await
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Authentication routes: one-time-code login and session lifecycle.
//!
//! This is the only session-bootstrap implementation in the app; every entry
//! point (code verification, token handoff, magic-link callback) funnels into
//! `session::establish`.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::messages;
use crate::models::TokenPair;
use crate::session;
use crate::AppState;

/// Client-visible resend cooldown, also enforced server-side per email.
const RESEND_COOLDOWN_SECS: i64 = 60;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/otp", post(request_otp))
        .route("/auth/verify", post(verify_otp))
        .route("/api/auth/session", post(set_session))
        .route("/auth/callback", get(auth_callback))
        .route("/auth/refresh", post(refresh_session))
        .route("/auth/logout", post(logout))
}

// ─── OTP Issuance ────────────────────────────────────────────

#[derive(Deserialize)]
pub struct OtpRequest {
    pub email: String,
    /// Human-verification challenge token, passed through to the provider
    #[serde(default)]
    pub captcha_token: Option<String>,
}

#[derive(Serialize)]
pub struct OtpResponse {
    pub success: bool,
    pub message: &'static str,
    pub resend_after_secs: i64,
}

/// Request a 6-digit one-time code emailed to the given address.
async fn request_otp(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<OtpRequest>,
) -> Result<Json<OtpResponse>> {
    let email = payload.email.trim().to_lowercase();
    if !validator::ValidateEmail::validate_email(&email) {
        return Err(AppError::BadRequest(messages::EMAIL_MISSING.to_string()));
    }

    // Server-side cooldown, independent of whatever the provider enforces.
    if let Some(last_sent) = state.resend_cooldowns.get(&email) {
        let elapsed = (Utc::now() - *last_sent).num_seconds();
        if elapsed < RESEND_COOLDOWN_SECS {
            return Err(AppError::RateLimited(
                (RESEND_COOLDOWN_SECS - elapsed) as u64,
            ));
        }
    }

    state
        .identity
        .request_code(
            &email,
            state.config.allow_signup,
            payload.captcha_token.as_deref(),
        )
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "One-time code issuance failed");
            AppError::BadRequest(messages::for_identity_error(&err).to_string())
        })?;

    // Sweep lapsed cooldowns on insert so the map stays bounded.
    let now = Utc::now();
    state
        .resend_cooldowns
        .retain(|_, sent| (now - *sent).num_seconds() < RESEND_COOLDOWN_SECS);
    state.resend_cooldowns.insert(email.clone(), now);
    tracing::info!(email = %email, "One-time code issued");

    Ok(Json(OtpResponse {
        success: true,
        message: messages::OTP_SENT,
        resend_after_secs: RESEND_COOLDOWN_SECS,
    }))
}

// ─── OTP Verification ────────────────────────────────────────

#[derive(Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

#[derive(Serialize)]
pub struct VerifyResponse {
    pub success: bool,
    pub redirect_to: &'static str,
}

/// Verify a one-time code and establish the session.
///
/// On success the response carries the session cookies; the client is only
/// told to proceed once the provider has confirmed the new pair.
async fn verify_otp(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<VerifyRequest>,
) -> Response {
    let email = payload.email.trim().to_lowercase();
    let code = payload.code.trim();
    if code.len() != 6 || !code.chars().all(|c| c.is_ascii_digit()) {
        return AppError::BadRequest(messages::CODE_FORMAT.to_string()).into_response();
    }

    let verified = match state.identity.verify_code(&email, code).await {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(email = %email, error = %err, "Code verification failed");
            return AppError::BadRequest(messages::for_identity_error(&err).to_string())
                .into_response();
        }
    };

    let (jar, result) =
        session::establish(&state.identity, &state.config, jar, &verified.tokens).await;

    match result {
        Ok(_session) => (
            jar,
            Json(VerifyResponse {
                success: true,
                redirect_to: "/app",
            }),
        )
            .into_response(),
        Err(err) => (
            jar,
            AppError::BadRequest(messages::for_identity_error(&err).to_string()),
        )
            .into_response(),
    }
}

// ─── Token Handoff ───────────────────────────────────────────

/// Hand a token pair off to the server for cookie persistence.
///
/// This endpoint exists so tokens end up in httpOnly cookies instead of
/// browser storage. Replaying it with the same pair is a cookie overwrite.
async fn set_session(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(tokens): Json<TokenPair>,
) -> Response {
    if tokens.access_token.is_empty() || tokens.refresh_token.is_empty() {
        return AppError::BadRequest("Missing access or refresh token".to_string()).into_response();
    }

    let (jar, result) = session::establish(&state.identity, &state.config, jar, &tokens).await;

    match result {
        Ok(_session) => (jar, Json(serde_json::json!({ "success": true }))).into_response(),
        Err(err) => (
            jar,
            AppError::BadRequest(messages::for_identity_error(&err).to_string()),
        )
            .into_response(),
    }
}

// ─── Magic-link Callback ─────────────────────────────────────

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
}

/// Magic-link redirect target: exchange the code, establish the session and
/// send the browser on to `/app`, or back to `/login` with a message.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    if let Some(error) = params.error_description {
        tracing::warn!(error = %error, "Provider reported callback error");
        return Redirect::to(&messages::login_redirect_with_error(messages::AUTH_FAILED))
            .into_response();
    }

    let Some(code) = params.code else {
        return Redirect::to(&messages::login_redirect_with_error(messages::AUTH_FAILED))
            .into_response();
    };

    let verified = match state.identity.exchange_code(&code).await {
        Ok(verified) => verified,
        Err(err) => {
            tracing::warn!(error = %err, "Callback code exchange failed");
            return Redirect::to(&messages::login_redirect_with_error(
                messages::for_identity_error(&err),
            ))
            .into_response();
        }
    };

    let (jar, result) =
        session::establish(&state.identity, &state.config, jar, &verified.tokens).await;

    match result {
        Ok(session) => {
            tracing::info!(email = %session.email, "Magic-link login complete");
            (jar, Redirect::to("/app")).into_response()
        }
        Err(err) => (
            jar,
            Redirect::to(&messages::login_redirect_with_error(
                messages::for_identity_error(&err),
            )),
        )
            .into_response(),
    }
}

// ─── Keepalive & Logout ──────────────────────────────────────

/// Proactively refresh the session before the access token expires.
///
/// Best-effort: failures are logged and the client gets 204 either way; a
/// session that cannot be refreshed simply expires at the refresh token's
/// own lifetime boundary.
async fn refresh_session(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    let Some(refresh) = jar.get(session::REFRESH_COOKIE).map(|c| c.value().to_string()) else {
        return StatusCode::NO_CONTENT.into_response();
    };

    match state.identity.refresh(&refresh).await {
        Ok(verified) => {
            let (access, refresh) = session::session_cookies(&state.config, &verified.tokens);
            let jar = jar.add(access).add(refresh);
            tracing::debug!(user_id = %verified.identity.id, "Session keepalive refresh");
            (jar, StatusCode::NO_CONTENT).into_response()
        }
        Err(err) => {
            tracing::info!(error = %err, "Keepalive refresh failed, session will expire naturally");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// Sign out: revoke the session with the provider (best-effort) and clear
/// the cookies.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if let Some(access) = jar.get(session::ACCESS_COOKIE) {
        if let Err(err) = state.identity.sign_out(access.value()).await {
            tracing::warn!(error = %err, "Provider sign-out failed, clearing cookies anyway");
        }
    }

    let jar = session::clear(&state.config, jar);
    (jar, StatusCode::NO_CONTENT).into_response()
}

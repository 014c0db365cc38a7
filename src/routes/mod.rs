// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! HTTP route handlers.

pub mod admin;
pub mod auth;
pub mod pages;
pub mod profiles;

use crate::middleware::guard;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub build_id: String,
}

/// Health check response
async fn health_check() -> Json<HealthResponse> {
    let build_id = option_env!("BUILD_ID").unwrap_or("unknown").to_string();
    Json(HealthResponse {
        status: "ok".to_string(),
        build_id,
    })
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    // CORS layer - allow requests from the public URL and localhost (for dev)
    let public_url = state.config.public_url.clone();
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                origin_str == public_url
                    || origin_str.starts_with("http://localhost")
                    || origin_str.starts_with("http://127.0.0.1")
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT]);

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/", get(pages::index))
        .merge(auth::routes());

    // Login page bounces already-authenticated visitors to /app
    let login_route = Router::new().route("/login", get(pages::login)).route_layer(
        middleware::from_fn_with_state(state.clone(), guard::redirect_if_authenticated),
    );

    // Guarded pages: unauthenticated visitors are redirected to /login
    let guarded_pages = Router::new()
        .route("/app", get(pages::app))
        .route("/profile", get(pages::profile))
        .route("/profile/{id}", get(pages::profile))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::require_session_page,
        ));

    let admin_page = Router::new().route("/admin", get(pages::admin)).route_layer(
        middleware::from_fn_with_state(state.clone(), guard::require_admin_page),
    );

    // Session-scoped API
    let session_api = profiles::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        guard::require_session_api,
    ));

    // Admin API re-checks the admin flag on every request
    let admin_api = admin::routes().route_layer(middleware::from_fn_with_state(
        state.clone(),
        guard::require_admin_api,
    ));

    Router::new()
        .merge(public_routes)
        .merge(login_route)
        .merge(guarded_pages)
        .merge(admin_page)
        .merge(session_api)
        .merge(admin_api)
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

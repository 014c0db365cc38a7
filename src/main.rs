// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Vizitka API Server
//!
//! Digital business cards for event attendees: passwordless email login
//! against a hosted identity provider, an attendee directory and contact
//! export for organizers.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use vizitka::{
    config::Config,
    services::{IdentityClient, PhotoStorage, ProfileStore},
    AppState,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting Vizitka API");

    // Identity provider client (auth endpoints, publishable key)
    let identity = IdentityClient::new(
        &config.provider_url,
        &config.anon_key,
        config.provider_timeout_secs,
    )
    .expect("Failed to initialize identity client");

    // Profile store and photo bucket use the elevated server-side credential;
    // it never leaves this process.
    let profiles = ProfileStore::new(
        &config.provider_url,
        &config.service_role_key,
        config.provider_timeout_secs,
    )
    .expect("Failed to initialize profile store");

    let storage = PhotoStorage::new(
        &config.provider_url,
        &config.service_role_key,
        config.provider_timeout_secs,
    )
    .expect("Failed to initialize photo storage");

    tracing::info!(provider = %config.provider_url, "Provider clients initialized");

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        identity,
        profiles,
        storage,
        resend_cooldowns: dashmap::DashMap::new(),
    });

    // Build router
    let app = vizitka::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vizitka=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}

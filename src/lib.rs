// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Vizitka: digital business cards for event attendees
//!
//! This crate provides the backend for the attendee directory: passwordless
//! email one-time-code login against a hosted identity provider, cookie-based
//! sessions, profile storage and admin exports.

pub mod config;
pub mod error;
pub mod messages;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;

use config::Config;
use services::{IdentityClient, PhotoStorage, ProfileStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub identity: IdentityClient,
    pub profiles: ProfileStore,
    pub storage: PhotoStorage,
    /// Per-email resend cooldowns for one-time codes (unix timestamp of the
    /// last successful send).
    pub resend_cooldowns: dashmap::DashMap<String, chrono::DateTime<chrono::Utc>>,
}

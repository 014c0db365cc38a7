// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Middleware modules (route guard, security headers).

pub mod guard;
pub mod security;

pub use guard::{
    redirect_if_authenticated, require_admin_api, require_admin_page, require_session_api,
    require_session_page,
};

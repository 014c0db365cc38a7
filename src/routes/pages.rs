// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Guarded page shells.
//!
//! The pages are thin HTML shells the single-page frontend hydrates; the
//! interesting part is which guard each one sits behind (see routes/mod.rs).

use axum::response::Html;

fn shell(title: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"sk\"><head><meta charset=\"utf-8\">\
         <title>{title} – Vizitka</title></head>\
         <body><div id=\"root\" data-page=\"{title}\"></div>\
         <script src=\"/assets/app.js\" defer></script></body></html>"
    ))
}

/// Landing page (public).
pub async fn index() -> Html<String> {
    shell("Vitajte")
}

/// Login page (public; authenticated visitors are redirected to /app by
/// the guard layered on this route).
pub async fn login() -> Html<String> {
    shell("Prihlásenie")
}

/// Attendee directory (guarded).
pub async fn app() -> Html<String> {
    shell("Zoznam účastníkov")
}

/// Profile detail / edit pages (guarded).
pub async fn profile() -> Html<String> {
    shell("Profil")
}

/// Admin panel (guarded, admin only).
pub async fn admin() -> Html<String> {
    shell("Administrácia")
}

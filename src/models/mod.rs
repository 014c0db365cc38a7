// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Data models for the application.

pub mod export;
pub mod profile;
pub mod session;

pub use profile::{Profile, ProfileInput};
pub use session::{Identity, Session, TokenPair};

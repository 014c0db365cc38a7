// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! Services module - clients for the hosted backend.

pub mod identity;
pub mod profiles;
pub mod storage;

pub use identity::{IdentityClient, IdentityError, MockIdentity, VerifiedSession};
pub use profiles::ProfileStore;
pub use storage::PhotoStorage;

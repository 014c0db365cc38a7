// SPDX-License-Identifier: MIT
// Copyright 2026 Vizitka Team

//! User-facing messages, localized for the event audience (Slovak).
//!
//! Auth failures are always translated to one of these before they reach a
//! browser; raw provider errors never do.

use crate::services::identity::IdentityError;

pub const OTP_SENT: &str = "Nový overovací kód bol odoslaný!";
pub const OTP_EXPIRED: &str = "Overovací kód vypršal. Požiadajte o nový kód.";
pub const OTP_INVALID: &str = "Neplatný overovací kód. Skúste to znova.";
pub const OTP_RATE_LIMITED: &str = "Príliš veľa pokusov. Skúste to neskôr.";
pub const AUTH_FAILED: &str = "Prihlásenie zlyhalo. Skúste to znova.";
pub const NETWORK_ERROR: &str = "Server je momentálne nedostupný. Skúste to znova.";
pub const EMAIL_MISSING: &str = "Chyba: E-mail nie je k dispozícii";
pub const CODE_FORMAT: &str = "Prosím zadajte 6-miestny kód";

/// Localized message for an identity-provider failure.
pub fn for_identity_error(err: &IdentityError) -> &'static str {
    match err {
        IdentityError::OtpExpired => OTP_EXPIRED,
        IdentityError::OtpInvalid => OTP_INVALID,
        IdentityError::RateLimited => OTP_RATE_LIMITED,
        IdentityError::AccessDenied => AUTH_FAILED,
        IdentityError::Network(_) => NETWORK_ERROR,
        IdentityError::Provider(_) => AUTH_FAILED,
    }
}

/// Build the `/login` redirect target carrying a localized error message.
pub fn login_redirect_with_error(message: &str) -> String {
    format!("/login?error={}", urlencoding::encode(message))
}

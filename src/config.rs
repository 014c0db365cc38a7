//! Application configuration loaded from environment variables.
//!
//! The identity provider keys are secrets; the service-role key in particular
//! bypasses row-level security and must never reach a client.

use std::env;

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the hosted identity/profile backend
    pub provider_url: String,
    /// Public (anon) API key for the backend
    pub anon_key: String,
    /// Elevated service-role key; server-side writes only
    pub service_role_key: String,
    /// Public URL this app is served from (drives cookie `Secure` flag)
    pub public_url: String,
    /// Server port
    pub port: u16,
    /// Whether requesting a code for an unknown email creates an account
    pub allow_signup: bool,
    /// Timeout for every call to the hosted backend, in seconds
    pub provider_timeout_secs: u64,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            provider_url: env::var("PROVIDER_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .map_err(|_| ConfigError::Missing("PROVIDER_URL"))?,
            anon_key: env::var("PROVIDER_ANON_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("PROVIDER_ANON_KEY"))?,
            service_role_key: env::var("PROVIDER_SERVICE_ROLE_KEY")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("PROVIDER_SERVICE_ROLE_KEY"))?,
            public_url: env::var("PUBLIC_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            allow_signup: env::var("ALLOW_SIGNUP")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            provider_timeout_secs: env::var("PROVIDER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
        })
    }

    /// Whether session cookies should carry the `Secure` attribute.
    pub fn cookies_secure(&self) -> bool {
        self.public_url.starts_with("https://")
    }

    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            provider_url: "http://localhost:54321".to_string(),
            anon_key: "test_anon_key".to_string(),
            service_role_key: "test_service_role_key".to_string(),
            public_url: "http://localhost:8080".to_string(),
            port: 8080,
            allow_signup: true,
            provider_timeout_secs: 10,
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

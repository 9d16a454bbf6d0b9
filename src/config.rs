// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client configuration loaded from environment variables.
//!
//! A `.env` file in the working directory is honored for local development.

use std::env;
use std::path::PathBuf;

/// Live deployment of the GymBuddy API, used when no override is set.
pub const LIVE_API_ORIGIN: &str = "https://gymbuddy-api-1038994855355.us-central1.run.app";

/// Firebase Authentication REST endpoint.
pub const FIREBASE_AUTH_URL: &str = "https://identitytoolkit.googleapis.com/v1";

/// Port the API listens on when pointed at a local host.
const LOCAL_API_PORT: u16 = 8000;

/// How the client signs users in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMethod {
    /// Username/password posted straight to the backend token endpoint.
    Token,
    /// Firebase email/password sign-in, exchanged for a backend token.
    Firebase,
}

impl AuthMethod {
    fn parse(raw: &str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "token" | "password" => Ok(AuthMethod::Token),
            "firebase" | "provider" => Ok(AuthMethod::Firebase),
            other => Err(ConfigError::Invalid {
                var: "GYMBUDDY_AUTH",
                reason: format!("unknown sign-in method '{}'", other),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::Token => "token",
            AuthMethod::Firebase => "firebase",
        }
    }
}

/// Client configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// API base URL including the `/api/v1` prefix
    pub api_base_url: String,
    /// Sign-in method
    pub auth_method: AuthMethod,
    /// Firebase Web API key (public, required for Firebase sign-in)
    pub firebase_api_key: Option<String>,
    /// Firebase Authentication REST base URL
    pub firebase_auth_url: String,
    /// Where the session token is persisted
    pub session_file: PathBuf,
}

impl Config {
    /// Default config for testing only.
    pub fn test_default() -> Self {
        Self {
            api_base_url: "http://127.0.0.1:8000/api/v1".to_string(),
            auth_method: AuthMethod::Token,
            firebase_api_key: Some("test-api-key".to_string()),
            firebase_auth_url: FIREBASE_AUTH_URL.to_string(),
            session_file: std::env::temp_dir().join("gymbuddy-test-session.json"),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let origin = api_origin(
            env::var("GYMBUDDY_API_URL").ok().as_deref(),
            env::var("GYMBUDDY_API_HOST").ok().as_deref(),
        );

        let auth_method = match env::var("GYMBUDDY_AUTH") {
            Ok(raw) => AuthMethod::parse(&raw)?,
            Err(_) => AuthMethod::Firebase,
        };

        let firebase_api_key = env::var("FIREBASE_API_KEY")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        if auth_method == AuthMethod::Firebase && firebase_api_key.is_none() {
            return Err(ConfigError::Missing("FIREBASE_API_KEY"));
        }

        let session_file = match env::var("GYMBUDDY_SESSION_FILE") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_session_file()?,
        };

        Ok(Self {
            api_base_url: format!("{}/api/v1", origin),
            auth_method,
            firebase_api_key,
            firebase_auth_url: env::var("FIREBASE_AUTH_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| FIREBASE_AUTH_URL.to_string()),
            session_file,
        })
    }
}

/// Resolve the API origin (no `/api/v1` suffix).
///
/// An explicit URL wins, then a bare local host on the default port, then
/// the live deployment.
pub fn api_origin(explicit_url: Option<&str>, host: Option<&str>) -> String {
    if let Some(url) = explicit_url.map(str::trim).filter(|u| !u.is_empty()) {
        let url = url.trim_end_matches('/');
        let url = url.strip_suffix("/api/v1").unwrap_or(url);
        return url.trim_end_matches('/').to_string();
    }

    if let Some(host) = host.map(str::trim).filter(|h| !h.is_empty()) {
        let host = host
            .strip_prefix("http://")
            .or_else(|| host.strip_prefix("https://"))
            .unwrap_or(host)
            .trim_end_matches('/');
        return format!("http://{}:{}", host, LOCAL_API_PORT);
    }

    LIVE_API_ORIGIN.to_string()
}

fn default_session_file() -> Result<PathBuf, ConfigError> {
    let home = env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map_err(|_| ConfigError::Missing("GYMBUDDY_SESSION_FILE"))?;
    Ok(PathBuf::from(home).join(".gymbuddy").join("session.json"))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

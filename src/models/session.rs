// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client-side authentication state.

use serde::{Deserialize, Serialize};

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Persisted state has not been read yet.
    Unknown,
    LoggedOut,
    LoggedIn,
}

/// Snapshot of the current session.
///
/// Only `SessionManager` builds or changes these; everyone else reads clones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Backend token, never empty when present
    pub(crate) token: Option<String>,
    /// Display identifier of the signed-in user
    pub(crate) email: Option<String>,
    /// Last login/sign-up failure, kept until cleared
    pub(crate) auth_error: Option<String>,
    pub(crate) loaded: bool,
}

impl Session {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn auth_error(&self) -> Option<&str> {
        self.auth_error.as_deref()
    }

    pub fn state(&self) -> SessionState {
        match (&self.token, self.loaded) {
            (Some(_), _) => SessionState::LoggedIn,
            (None, true) => SessionState::LoggedOut,
            (None, false) => SessionState::Unknown,
        }
    }
}

/// Backend token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub token: String,
}

/// What a successful login or sign-up hands to the session manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub token: String,
    pub email: Option<String>,
}

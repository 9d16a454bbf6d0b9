// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Error types shared by the request gateway and the session manager.
//!
//! Every failure carries a message that is fit to show to the user as-is.

use crate::store::StoreError;
use reqwest::StatusCode;

/// Failure of a single call through the request gateway.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("{message}")]
    Http { status: StatusCode, message: String },

    /// The request never reached the backend or no response arrived.
    #[error("Could not connect to server: {0}")]
    Transport(String),

    /// A 2xx body did not have the shape the caller asked for.
    #[error("Unexpected response from server: {0}")]
    Decode(String),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl ApiError {
    /// HTTP status of the failed response, if the backend answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// True when the backend rejected the session token (HTTP 401).
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(StatusCode::UNAUTHORIZED)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ApiError::Cancelled)
    }
}

/// Failure of a login, sign-up, logout or password reset.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The identity provider rejected the request.
    #[error("{0}")]
    Provider(String),

    /// The backend token endpoint or exchange call failed.
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("Session storage error: {0}")]
    Storage(#[from] StoreError),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{operation} is not available with {method} sign-in")]
    Unsupported {
        method: &'static str,
        operation: &'static str,
    },
}

/// Result type alias for gateway calls
pub type Result<T> = std::result::Result<T, ApiError>;

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pluggable sign-in strategies.
//!
//! Both strategies end with a backend token; they differ in how the
//! credential is verified:
//! - `PasswordTokenAuth` posts username/password to `/auth/token/`
//! - `ProviderAuth` verifies with the identity provider, then exchanges the
//!   provider's ID token at `/auth/firebase-token/`

use crate::error::AuthError;
use crate::models::{AuthGrant, TokenResponse};
use crate::services::api::{ApiClient, Method, RequestOptions};
use crate::services::identity::{IdentityProvider, IdentityUser};
use async_trait::async_trait;
use std::sync::Arc;

/// A way of turning a credential into a backend token.
#[async_trait]
pub trait AuthStrategy: Send + Sync {
    /// Short name for logs and messages.
    fn name(&self) -> &'static str;

    async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, AuthError>;

    async fn sign_up(&self, identifier: &str, password: &str) -> Result<AuthGrant, AuthError>;

    /// Drop any external session. Local state is the caller's business.
    async fn logout(&self) -> Result<(), AuthError>;

    async fn send_password_reset(&self, _email: &str) -> Result<(), AuthError> {
        Err(AuthError::Unsupported {
            method: self.name(),
            operation: "Password reset",
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Username/password against the backend
// ─────────────────────────────────────────────────────────────────────────────

/// Backend-only sign-in via `POST /auth/token/`.
#[derive(Clone)]
pub struct PasswordTokenAuth {
    api: ApiClient,
}

impl PasswordTokenAuth {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthStrategy for PasswordTokenAuth {
    fn name(&self) -> &'static str {
        "token"
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, AuthError> {
        let options = RequestOptions::new(Method::Post).body(serde_json::json!({
            "username": identifier,
            "password": password,
        }));
        let response: TokenResponse = self.api.request("/auth/token/", options).await?;

        Ok(AuthGrant {
            token: response.token,
            email: Some(identifier.to_string()),
        })
    }

    async fn sign_up(&self, _identifier: &str, _password: &str) -> Result<AuthGrant, AuthError> {
        // The backend has no registration endpoint; accounts are made by an admin.
        Err(AuthError::Unsupported {
            method: self.name(),
            operation: "Sign-up",
        })
    }

    async fn logout(&self) -> Result<(), AuthError> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Identity provider + token exchange
// ─────────────────────────────────────────────────────────────────────────────

/// Provider-backed sign-in with backend token exchange.
#[derive(Clone)]
pub struct ProviderAuth {
    api: ApiClient,
    provider: Arc<dyn IdentityProvider>,
}

impl ProviderAuth {
    pub fn new(api: ApiClient, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { api, provider }
    }

    /// Exchange a provider ID token for a backend token.
    pub async fn exchange_token(&self, id_token: &str) -> Result<String, AuthError> {
        let options = RequestOptions::new(Method::Post).body(serde_json::json!({
            "id_token": id_token,
        }));
        let response: TokenResponse = self.api.request("/auth/firebase-token/", options).await?;
        Ok(response.token)
    }

    async fn grant_for(&self, user: IdentityUser, identifier: &str) -> Result<AuthGrant, AuthError> {
        let token = self.exchange_token(&user.id_token).await?;
        Ok(AuthGrant {
            token,
            email: Some(user.email.unwrap_or_else(|| identifier.to_string())),
        })
    }
}

#[async_trait]
impl AuthStrategy for ProviderAuth {
    fn name(&self) -> &'static str {
        "firebase"
    }

    async fn login(&self, identifier: &str, password: &str) -> Result<AuthGrant, AuthError> {
        let user = self.provider.sign_in(identifier, password).await?;
        self.grant_for(user, identifier).await
    }

    async fn sign_up(&self, identifier: &str, password: &str) -> Result<AuthGrant, AuthError> {
        let user = self.provider.create_account(identifier, password).await?;
        self.grant_for(user, identifier).await
    }

    async fn logout(&self) -> Result<(), AuthError> {
        self.provider.sign_out().await
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        self.provider.send_password_reset(email).await
    }
}

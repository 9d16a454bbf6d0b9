// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Identity provider integration (Firebase Authentication REST API).
//!
//! Handles:
//! - Email/password sign-in and account creation
//! - ID token minting for the backend exchange
//! - Password reset emails
//!
//! Only the ID token is kept from a sign-in; it is handed straight to the
//! backend exchange. Refresh tokens are discarded, so no provider session
//! outlives the call.

use crate::error::AuthError;
use async_trait::async_trait;
use serde::Deserialize;

/// A signed-in identity-provider user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityUser {
    pub email: Option<String>,
    /// Short-lived identity token, consumed by the backend exchange
    pub id_token: String,
}

/// External identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify an email/password credential.
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, AuthError>;

    /// Create an account and sign it in.
    async fn create_account(&self, email: &str, password: &str)
        -> Result<IdentityUser, AuthError>;

    /// Forget the provider session.
    async fn sign_out(&self) -> Result<(), AuthError>;

    /// Ask the provider to email a password reset link.
    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError>;
}

/// Firebase Authentication client.
pub struct FirebaseIdentity {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl FirebaseIdentity {
    /// Create a client against `base_url` (normally
    /// `https://identitytoolkit.googleapis.com/v1`).
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn endpoint(&self, action: &str) -> String {
        format!(
            "{}/accounts:{}?key={}",
            self.base_url,
            action,
            urlencoding::encode(&self.api_key)
        )
    }

    /// Email/password call shared by sign-in and sign-up.
    async fn password_call(
        &self,
        action: &str,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, AuthError> {
        let body = serde_json::json!({
            "email": email,
            "password": password,
            "returnSecureToken": true,
        });

        let response: FirebaseAuthResponse = self.post(action, &body).await?;

        Ok(IdentityUser {
            email: response.email.filter(|e| !e.is_empty()),
            id_token: response.id_token,
        })
    }

    async fn post<T: for<'de> Deserialize<'de>>(
        &self,
        action: &str,
        body: &serde_json::Value,
    ) -> Result<T, AuthError> {
        let response = self
            .http
            .post(self.endpoint(action))
            .json(body)
            .send()
            .await
            .map_err(|e| AuthError::Provider(format!("Could not reach sign-in service: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let code = serde_json::from_str::<FirebaseErrorBody>(&body)
                .map(|b| b.error.message)
                .unwrap_or_else(|_| status.to_string());
            tracing::warn!(action, status = %status, code = %code, "Identity provider rejected request");
            return Err(AuthError::Provider(friendly_message(&code)));
        }

        response
            .json()
            .await
            .map_err(|e| AuthError::Provider(format!("Unexpected sign-in response: {}", e)))
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentity {
    async fn sign_in(&self, email: &str, password: &str) -> Result<IdentityUser, AuthError> {
        self.password_call("signInWithPassword", email, password)
            .await
    }

    async fn create_account(
        &self,
        email: &str,
        password: &str,
    ) -> Result<IdentityUser, AuthError> {
        self.password_call("signUp", email, password).await
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        // Firebase has no server-side sign-out for ID tokens and nothing is
        // held locally.
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let body = serde_json::json!({
            "requestType": "PASSWORD_RESET",
            "email": email,
        });
        let _: serde_json::Value = self.post("sendOobCode", &body).await?;
        tracing::info!("Password reset email requested");
        Ok(())
    }
}

/// Sign-in/sign-up response from Firebase.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FirebaseAuthResponse {
    id_token: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorBody {
    error: FirebaseErrorDetail,
}

#[derive(Debug, Deserialize)]
struct FirebaseErrorDetail {
    message: String,
}

/// Map Firebase error codes (`EMAIL_EXISTS`, `WEAK_PASSWORD : ...`) to
/// messages a user can act on.
pub fn friendly_message(code: &str) -> String {
    let key = code.split(" : ").next().unwrap_or(code).trim();
    match key {
        "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
            "Invalid email or password".to_string()
        }
        "EMAIL_EXISTS" => "An account with this email already exists".to_string(),
        "INVALID_EMAIL" | "MISSING_EMAIL" => "Please enter a valid email address".to_string(),
        "WEAK_PASSWORD" => "Password should be at least 6 characters".to_string(),
        "MISSING_PASSWORD" => "Please enter a password".to_string(),
        "USER_DISABLED" => "This account has been disabled".to_string(),
        "TOO_MANY_ATTEMPTS_TRY_LATER" => {
            "Too many attempts. Please try again later".to_string()
        }
        _ => code.to_string(),
    }
}

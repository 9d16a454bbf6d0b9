// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session manager: the single writer of the client's authentication state.
//!
//! Readers (the workout API, the CLI) hold an `Arc<SessionManager>` and ask
//! for the token per call. The manager:
//! - Restores the persisted token and email once at startup
//! - Runs login/sign-up through the configured `AuthStrategy`
//! - Persists the backend token and display email on success
//! - Clears everything on logout, or when a caller reports a 401 for the
//!   token that is still current
//!
//! State changes (establish, logout, 401 handling) run one at a time under
//! the `transition` lock, so a store write and its in-memory publish are
//! never interleaved with another change.
//!
//! Login and sign-up failures are returned to the caller and also kept as
//! `auth_error` until `clear_auth_error` or the next attempt.

use crate::error::AuthError;
use crate::models::{AuthGrant, Session, SessionState};
use crate::services::auth::AuthStrategy;
use crate::store::{keys, SessionStore};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use validator::Validate;

/// Credential as typed by the user.
#[derive(Debug, Validate)]
struct Credentials {
    #[validate(length(min = 1, message = "Please enter your email or username"))]
    identifier: String,
    #[validate(length(min = 1, message = "Please enter a password"))]
    password: String,
}

impl Credentials {
    fn check(identifier: &str, password: &str) -> Result<Self, AuthError> {
        let credentials = Self {
            identifier: identifier.trim().to_string(),
            password: password.to_string(),
        };
        credentials.validate().map_err(|errors| {
            let message = errors
                .field_errors()
                .values()
                .flat_map(|errs| errs.iter())
                .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                .next()
                .unwrap_or_else(|| errors.to_string());
            AuthError::InvalidInput(message)
        })?;
        Ok(credentials)
    }
}

#[derive(Clone, Copy)]
enum Flow {
    Login,
    SignUp,
}

impl Flow {
    fn as_str(&self) -> &'static str {
        match self {
            Flow::Login => "login",
            Flow::SignUp => "sign_up",
        }
    }
}

/// Owner of the current session.
pub struct SessionManager {
    strategy: Arc<dyn AuthStrategy>,
    store: SessionStore,
    session: RwLock<Session>,
    transition: Mutex<()>,
}

impl SessionManager {
    /// Create a manager in the `Unknown` state. Call `restore` before use.
    pub fn new(strategy: Arc<dyn AuthStrategy>, store: SessionStore) -> Self {
        Self {
            strategy,
            store,
            session: RwLock::new(Session::default()),
            transition: Mutex::new(()),
        }
    }

    /// Name of the configured sign-in strategy.
    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Read the persisted token and email (Unknown → LoggedIn | LoggedOut).
    pub async fn restore(&self) -> Result<SessionState, AuthError> {
        let token = self
            .store
            .get(keys::TOKEN)
            .await?
            .filter(|t| !t.trim().is_empty());
        let email = self.store.get(keys::EMAIL).await?;

        let mut session = self.session.write().await;
        session.email = if token.is_some() { email } else { None };
        session.token = token;
        session.loaded = true;

        let state = session.state();
        tracing::info!(state = ?state, strategy = self.strategy.name(), "Session restored");
        Ok(state)
    }

    pub async fn login(&self, identifier: &str, password: &str) -> Result<(), AuthError> {
        self.authenticate(Flow::Login, identifier, password).await
    }

    pub async fn sign_up(&self, identifier: &str, password: &str) -> Result<(), AuthError> {
        self.authenticate(Flow::SignUp, identifier, password).await
    }

    async fn authenticate(
        &self,
        flow: Flow,
        identifier: &str,
        password: &str,
    ) -> Result<(), AuthError> {
        self.session.write().await.auth_error = None;

        let result = self.run_flow(flow, identifier, password).await;

        match result {
            Ok(grant) => self.establish(grant).await,
            Err(e) => {
                tracing::warn!(flow = flow.as_str(), error = %e, "Authentication failed");
                self.session.write().await.auth_error = Some(e.to_string());
                Err(e)
            }
        }
    }

    async fn run_flow(
        &self,
        flow: Flow,
        identifier: &str,
        password: &str,
    ) -> Result<AuthGrant, AuthError> {
        let credentials = Credentials::check(identifier, password)?;
        let grant = match flow {
            Flow::Login => {
                self.strategy
                    .login(&credentials.identifier, &credentials.password)
                    .await?
            }
            Flow::SignUp => {
                self.strategy
                    .sign_up(&credentials.identifier, &credentials.password)
                    .await?
            }
        };

        if grant.token.trim().is_empty() {
            return Err(AuthError::Provider(
                "Server returned an empty session token".to_string(),
            ));
        }
        Ok(grant)
    }

    /// Persist a fresh grant, then publish it in memory.
    async fn establish(&self, grant: AuthGrant) -> Result<(), AuthError> {
        let _transition = self.transition.lock().await;
        let email = grant.email.clone().unwrap_or_default();
        let persisted = self
            .store
            .set_many(&[(keys::TOKEN, grant.token.as_str()), (keys::EMAIL, email.as_str())])
            .await;

        if let Err(e) = persisted {
            let e = AuthError::from(e);
            self.session.write().await.auth_error = Some(e.to_string());
            return Err(e);
        }

        let mut session = self.session.write().await;
        session.token = Some(grant.token);
        session.email = grant.email;
        session.auth_error = None;
        session.loaded = true;

        tracing::info!(strategy = self.strategy.name(), "Logged in");
        Ok(())
    }

    /// Sign out of the provider and clear all persisted session state.
    ///
    /// The session ends up `LoggedOut` whatever happens; only a storage
    /// failure is reported.
    pub async fn logout(&self) -> Result<(), AuthError> {
        let _transition = self.transition.lock().await;
        self.end_session().await
    }

    /// A caller saw a 401 for `rejected_token`: end the session if that token
    /// is still the current one.
    ///
    /// A 401 for a token that has since been replaced by a new login is
    /// ignored.
    pub async fn handle_unauthorized(&self, rejected_token: &str) -> Result<(), AuthError> {
        let _transition = self.transition.lock().await;

        if self.session.read().await.token.as_deref() != Some(rejected_token) {
            tracing::debug!("Ignoring 401 for a session token that is no longer current");
            return Ok(());
        }

        tracing::warn!("Session token rejected by server, logging out");
        self.end_session().await
    }

    /// Clear provider, store and memory. Caller holds `transition`.
    async fn end_session(&self) -> Result<(), AuthError> {
        if let Err(e) = self.strategy.logout().await {
            tracing::warn!(error = %e, "Identity provider sign-out failed, clearing session anyway");
        }

        let cleared = self.store.remove_many(&[keys::TOKEN, keys::EMAIL]).await;

        {
            let mut session = self.session.write().await;
            session.token = None;
            session.email = None;
            session.loaded = true;
        }

        tracing::info!("Logged out");
        cleared.map_err(AuthError::from)
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let email = email.trim();
        if email.is_empty() {
            return Err(AuthError::InvalidInput(
                "Please enter your email".to_string(),
            ));
        }
        self.strategy.send_password_reset(email).await
    }

    pub async fn clear_auth_error(&self) {
        self.session.write().await.auth_error = None;
    }

    /// Current backend token, if logged in.
    pub async fn token(&self) -> Option<String> {
        self.session.read().await.token.clone()
    }

    pub async fn user_email(&self) -> Option<String> {
        self.session.read().await.email.clone()
    }

    pub async fn auth_error(&self) -> Option<String> {
        self.session.read().await.auth_error.clone()
    }

    pub async fn state(&self) -> SessionState {
        self.session.read().await.state()
    }

    /// Copy of the whole session.
    pub async fn snapshot(&self) -> Session {
        self.session.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Strategy that hands out a fixed token or a fixed failure.
    struct FixedStrategy {
        token: Option<&'static str>,
        logouts: AtomicUsize,
    }

    impl FixedStrategy {
        fn accepting(token: &'static str) -> Arc<Self> {
            Arc::new(Self {
                token: Some(token),
                logouts: AtomicUsize::new(0),
            })
        }

        fn rejecting() -> Arc<Self> {
            Arc::new(Self {
                token: None,
                logouts: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl AuthStrategy for FixedStrategy {
        fn name(&self) -> &'static str {
            "fixed"
        }

        async fn login(&self, identifier: &str, _password: &str) -> Result<AuthGrant, AuthError> {
            match self.token {
                Some(token) => Ok(AuthGrant {
                    token: token.to_string(),
                    email: Some(identifier.to_string()),
                }),
                None => Err(AuthError::Provider("Invalid email or password".to_string())),
            }
        }

        async fn sign_up(&self, identifier: &str, password: &str) -> Result<AuthGrant, AuthError> {
            self.login(identifier, password).await
        }

        async fn logout(&self) -> Result<(), AuthError> {
            self.logouts.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_restore_empty_store_is_logged_out() {
        let manager = SessionManager::new(FixedStrategy::accepting("abc"), SessionStore::memory());
        assert_eq!(manager.state().await, SessionState::Unknown);

        let state = manager.restore().await.unwrap();
        assert_eq!(state, SessionState::LoggedOut);
        assert_eq!(manager.token().await, None);
    }

    #[tokio::test]
    async fn test_restore_reads_persisted_token() {
        let store = SessionStore::memory();
        store
            .set_many(&[(keys::TOKEN, "saved"), (keys::EMAIL, "a@b.com")])
            .await
            .unwrap();

        let manager = SessionManager::new(FixedStrategy::accepting("abc"), store);
        assert_eq!(manager.restore().await.unwrap(), SessionState::LoggedIn);
        assert_eq!(manager.token().await.as_deref(), Some("saved"));
        assert_eq!(manager.user_email().await.as_deref(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn test_login_persists_token() {
        let store = SessionStore::memory();
        let manager = SessionManager::new(FixedStrategy::accepting("abc"), store.clone());
        manager.restore().await.unwrap();

        manager.login("a@b.com", "secret").await.unwrap();

        assert_eq!(manager.state().await, SessionState::LoggedIn);
        assert_eq!(store.get(keys::TOKEN).await.unwrap().as_deref(), Some("abc"));
        assert_eq!(
            store.get(keys::EMAIL).await.unwrap().as_deref(),
            Some("a@b.com")
        );
    }

    #[tokio::test]
    async fn test_failed_login_records_error_and_keeps_state() {
        let manager = SessionManager::new(FixedStrategy::rejecting(), SessionStore::memory());
        manager.restore().await.unwrap();

        let err = manager.login("a@b.com", "wrong").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid email or password");
        assert_eq!(manager.state().await, SessionState::LoggedOut);
        assert_eq!(
            manager.auth_error().await.as_deref(),
            Some("Invalid email or password")
        );

        manager.clear_auth_error().await;
        assert_eq!(manager.auth_error().await, None);
        assert_eq!(manager.state().await, SessionState::LoggedOut);
    }

    #[tokio::test]
    async fn test_blank_credentials_rejected_before_strategy() {
        let manager = SessionManager::new(FixedStrategy::accepting("abc"), SessionStore::memory());
        manager.restore().await.unwrap();

        let err = manager.login("   ", "secret").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidInput(_)));
        assert_eq!(err.to_string(), "Please enter your email or username");

        let err = manager.sign_up("a@b.com", "").await.unwrap_err();
        assert_eq!(err.to_string(), "Please enter a password");
        assert_eq!(manager.state().await, SessionState::LoggedOut);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let strategy = FixedStrategy::accepting("abc");
        let store = SessionStore::memory();
        let manager = SessionManager::new(strategy.clone(), store.clone());
        manager.restore().await.unwrap();
        manager.login("a@b.com", "secret").await.unwrap();

        manager.logout().await.unwrap();

        assert_eq!(manager.state().await, SessionState::LoggedOut);
        assert_eq!(manager.user_email().await, None);
        assert_eq!(store.get(keys::TOKEN).await.unwrap(), None);
        assert_eq!(store.get(keys::EMAIL).await.unwrap(), None);
        assert_eq!(strategy.logouts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_logout_from_unknown_state() {
        let manager = SessionManager::new(FixedStrategy::accepting("abc"), SessionStore::memory());
        manager.logout().await.unwrap();
        assert_eq!(manager.state().await, SessionState::LoggedOut);
    }

    #[tokio::test]
    async fn test_unauthorized_for_current_token_logs_out() {
        let store = SessionStore::memory();
        let manager = SessionManager::new(FixedStrategy::accepting("abc"), store.clone());
        manager.restore().await.unwrap();
        manager.login("a@b.com", "secret").await.unwrap();

        manager.handle_unauthorized("abc").await.unwrap();

        assert_eq!(manager.state().await, SessionState::LoggedOut);
        assert_eq!(store.get(keys::TOKEN).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_unauthorized_for_replaced_token_is_ignored() {
        let strategy = FixedStrategy::accepting("fresh");
        let store = SessionStore::memory();
        let manager = SessionManager::new(strategy.clone(), store.clone());
        manager.restore().await.unwrap();
        manager.login("a@b.com", "secret").await.unwrap();

        manager.handle_unauthorized("stale").await.unwrap();

        assert_eq!(manager.token().await.as_deref(), Some("fresh"));
        assert_eq!(
            store.get(keys::TOKEN).await.unwrap().as_deref(),
            Some("fresh")
        );
        assert_eq!(strategy.logouts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_failure_fails_login_without_publishing() {
        let dir = std::env::temp_dir().join(format!("gymbuddy-store-fail-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let blocker = dir.join("sub");

        let manager = SessionManager::new(
            FixedStrategy::accepting("abc"),
            SessionStore::file(blocker.join("session.json")),
        );
        assert_eq!(manager.restore().await.unwrap(), SessionState::LoggedOut);

        // A plain file where the session directory should be makes writes fail.
        std::fs::write(&blocker, "not a directory").unwrap();

        let err = manager.login("a@b.com", "secret").await.unwrap_err();

        assert!(matches!(err, AuthError::Storage(_)));
        assert_eq!(manager.state().await, SessionState::LoggedOut);
        assert_eq!(manager.token().await, None);
        assert_eq!(manager.user_email().await, None);
        assert!(manager.auth_error().await.is_some());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let store = SessionStore::memory();
        let manager = SessionManager::new(FixedStrategy::accepting("  "), store.clone());
        manager.restore().await.unwrap();

        let err = manager.login("a@b.com", "secret").await.unwrap_err();

        assert_eq!(err.to_string(), "Server returned an empty session token");
        assert_eq!(manager.state().await, SessionState::LoggedOut);
        assert_eq!(store.get(keys::TOKEN).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_password_reset_unsupported_by_default() {
        let manager = SessionManager::new(FixedStrategy::accepting("abc"), SessionStore::memory());
        let err = manager.send_password_reset("a@b.com").await.unwrap_err();
        assert!(matches!(err, AuthError::Unsupported { .. }));
    }
}

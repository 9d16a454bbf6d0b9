// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GymBuddy client: track workouts against the GymBuddy API
//!
//! This crate provides the request gateway for the GymBuddy REST API, the
//! session manager that owns the backend token, and typed workout
//! operations built on both.

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

use config::{AuthMethod, Config, ConfigError};
use services::{
    ApiClient, AuthStrategy, FirebaseIdentity, PasswordTokenAuth, ProviderAuth, SessionManager,
    WorkoutsApi,
};
use std::sync::Arc;
use store::SessionStore;

/// Shared client state.
pub struct AppState {
    pub config: Config,
    pub api: ApiClient,
    pub session: Arc<SessionManager>,
    pub workouts: WorkoutsApi,
}

impl AppState {
    /// Wire up the client for `config`, picking the sign-in strategy it names.
    ///
    /// The session starts `Unknown`; call `session.restore()` before use.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let api = ApiClient::new(config.api_base_url.clone());

        let strategy: Arc<dyn AuthStrategy> = match config.auth_method {
            AuthMethod::Token => Arc::new(PasswordTokenAuth::new(api.clone())),
            AuthMethod::Firebase => {
                let api_key = config
                    .firebase_api_key
                    .clone()
                    .ok_or(ConfigError::Missing("FIREBASE_API_KEY"))?;
                let firebase = FirebaseIdentity::new(config.firebase_auth_url.clone(), api_key);
                Arc::new(ProviderAuth::new(api.clone(), Arc::new(firebase)))
            }
        };

        Ok(Self::with_parts(
            config.clone(),
            api,
            strategy,
            SessionStore::file(config.session_file),
        ))
    }

    /// Assemble from explicit parts (tests, embedding).
    pub fn with_parts(
        config: Config,
        api: ApiClient,
        strategy: Arc<dyn AuthStrategy>,
        store: SessionStore,
    ) -> Self {
        let session = Arc::new(SessionManager::new(strategy, store));
        let workouts = WorkoutsApi::new(api.clone(), session.clone());
        Self {
            config,
            api,
            session,
            workouts,
        }
    }
}

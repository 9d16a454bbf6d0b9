// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - API access and session logic.

pub mod api;
pub mod auth;
pub mod identity;
pub mod session;
pub mod workouts;

pub use api::{ApiClient, Method, RequestOptions};
pub use auth::{AuthStrategy, PasswordTokenAuth, ProviderAuth};
pub use identity::{FirebaseIdentity, IdentityProvider, IdentityUser};
pub use session::SessionManager;
pub use workouts::{WorkoutWithHistory, WorkoutsApi};

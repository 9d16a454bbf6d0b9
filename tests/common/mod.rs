// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process fake GymBuddy API / identity provider for integration tests.
//!
//! Responses are scripted per `"METHOD /path?query"` and every request is
//! recorded so tests can assert on headers and bodies.

use axum::{
    extract::State,
    http::{header, HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    Router,
};
use gymbuddy_client::config::Config;
use gymbuddy_client::services::{ApiClient, AuthStrategy, PasswordTokenAuth};
use gymbuddy_client::store::{keys, SessionStore};
use gymbuddy_client::AppState;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A request as the fake server saw it.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub content_type: Option<String>,
    pub raw_body: String,
}

impl Recorded {
    #[allow(dead_code)]
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.raw_body).unwrap_or(Value::Null)
    }
}

#[derive(Default)]
struct FakeState {
    routes: Mutex<HashMap<String, (u16, String)>>,
    delays: Mutex<HashMap<String, Duration>>,
    requests: Mutex<Vec<Recorded>>,
}

/// Handle to a running fake server.
#[derive(Clone)]
pub struct FakeServer {
    pub origin: String,
    state: Arc<FakeState>,
}

#[allow(dead_code)]
impl FakeServer {
    /// Start a server on an ephemeral port.
    pub async fn start() -> Self {
        let state = Arc::new(FakeState::default());
        let router = Router::new().fallback(handle).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind fake server");
        let addr = listener.local_addr().expect("fake server address");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake server");
        });

        Self {
            origin: format!("http://{}", addr),
            state,
        }
    }

    /// API base URL as the client expects it.
    pub fn api_base(&self) -> String {
        format!("{}/api/v1", self.origin)
    }

    /// Script a JSON response for `"METHOD /full/path"`.
    pub fn respond(&self, route: &str, status: u16, body: Value) {
        self.respond_raw(route, status, &body.to_string());
    }

    /// Script a raw (possibly non-JSON) response.
    pub fn respond_raw(&self, route: &str, status: u16, body: &str) {
        self.state
            .routes
            .lock()
            .unwrap()
            .insert(route.to_string(), (status, body.to_string()));
    }

    /// Script a response under the `/api/v1` prefix.
    pub fn respond_api(&self, method: &str, path: &str, status: u16, body: Value) {
        self.respond(&format!("{} /api/v1{}", method, path), status, body);
    }

    /// Hold the response for `"METHOD /full/path"` for `delay` after the
    /// request has been recorded.
    pub fn delay(&self, route: &str, delay: Duration) {
        self.state
            .delays
            .lock()
            .unwrap()
            .insert(route.to_string(), delay);
    }

    /// Wait until a request for `"METHOD /full/path"` has arrived.
    pub async fn wait_for(&self, route: &str) {
        for _ in 0..500 {
            if !self.requests_to(route).is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("no request to {} arrived", route);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state.requests.lock().unwrap().clone()
    }

    /// Recorded requests for `"METHOD /full/path"`.
    pub fn requests_to(&self, route: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| format!("{} {}", r.method, r.path) == route)
            .collect()
    }
}

async fn handle(
    State(state): State<Arc<FakeState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let path = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());

    let header_value = |name: header::HeaderName| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(Recorded {
        method: method.to_string(),
        path: path.clone(),
        authorization: header_value(header::AUTHORIZATION),
        content_type: header_value(header::CONTENT_TYPE),
        raw_body: body,
    });

    let key = format!("{} {}", method, path);
    let delay = state.delays.lock().unwrap().get(&key).copied();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    let scripted = state.routes.lock().unwrap().get(&key).cloned();
    let (status, body) =
        scripted.unwrap_or_else(|| (404, r#"{"detail":"Not found."}"#.to_string()));

    let status = StatusCode::from_u16(status).expect("valid status");
    if body.is_empty() {
        return status.into_response();
    }
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// Client state against `server` using username/password sign-in.
#[allow(dead_code)]
pub fn token_app(server: &FakeServer, store: SessionStore) -> AppState {
    let mut config = Config::test_default();
    config.api_base_url = server.api_base();
    let api = ApiClient::new(config.api_base_url.clone());
    let strategy: Arc<dyn AuthStrategy> = Arc::new(PasswordTokenAuth::new(api.clone()));
    AppState::with_parts(config, api, strategy, store)
}

/// Client state that is already logged in with token `abc`.
#[allow(dead_code)]
pub async fn logged_in_app(server: &FakeServer) -> (AppState, SessionStore) {
    let store = SessionStore::memory();
    store
        .set_many(&[(keys::TOKEN, "abc"), (keys::EMAIL, "a@b.com")])
        .await
        .unwrap();
    let app = token_app(server, store.clone());
    app.session.restore().await.unwrap();
    (app, store)
}

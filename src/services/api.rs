// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request gateway for the GymBuddy REST API.
//!
//! One call, one HTTP round-trip:
//! - JSON request bodies, `Authorization: Token <value>` when a token is given
//! - Response bodies parsed as JSON (unparseable bodies read as `null`)
//! - Non-2xx responses turned into a single displayable message
//! - Optional cancellation while the call is in flight
//!
//! The gateway never reads or writes the session itself; callers pass the
//! token they want used.

use crate::error::{ApiError, Result};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

/// HTTP methods the API uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Method {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Per-call request options. The default is an unauthenticated GET.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions<'a> {
    pub method: Method,
    pub body: Option<Value>,
    pub token: Option<&'a str>,
    pub cancel: Option<&'a CancellationToken>,
}

impl<'a> RequestOptions<'a> {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    /// Attach a JSON body.
    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Serialize `payload` as the JSON body.
    pub fn json<T: serde::Serialize>(self, payload: &T) -> Result<Self> {
        let body =
            serde_json::to_value(payload).map_err(|e| ApiError::InvalidRequest(e.to_string()))?;
        Ok(self.body(body))
    }

    pub fn token(mut self, token: Option<&'a str>) -> Self {
        self.token = token;
        self
    }

    pub fn cancel(mut self, cancel: Option<&'a CancellationToken>) -> Self {
        self.cancel = cancel;
        self
    }
}

/// GymBuddy API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client for the API rooted at `base_url` (ending in `/api/v1`).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_http(reqwest::Client::new(), base_url)
    }

    /// Create a client sharing an existing connection pool.
    pub fn with_http(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Absolute URLs pass through; anything else is appended to the base URL.
    pub fn resolve_url(&self, path: &str) -> String {
        if path.starts_with("http") {
            path.to_string()
        } else {
            format!("{}{}", self.base_url, path)
        }
    }

    /// Issue a request and deserialize the JSON body into `T`.
    ///
    /// Bodies that are empty or not JSON read as `null`, so `T = ()` or
    /// `T = Option<_>` suits endpoints that return nothing.
    pub async fn request<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions<'_>,
    ) -> Result<T> {
        let value = self.request_value(path, options).await?;
        serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
    }

    /// Issue a request and return the parsed JSON body unmodified.
    pub async fn request_value(&self, path: &str, options: RequestOptions<'_>) -> Result<Value> {
        let url = self.resolve_url(path);
        let method = options.method;

        let mut builder = self
            .http
            .request(method.into(), &url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = options.token.filter(|t| !t.is_empty()) {
            builder = builder.header(AUTHORIZATION, format!("Token {}", token));
        }

        if let Some(body) = &options.body {
            builder = builder.json(body);
        }

        tracing::debug!(method = ?method, url = %url, "API request");

        let exchange = async {
            let response = builder
                .send()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            let status = response.status();
            let text = response
                .text()
                .await
                .map_err(|e| ApiError::Transport(e.to_string()))?;
            Ok::<_, ApiError>((status, text))
        };

        let (status, text) = match options.cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(url = %url, "API request cancelled");
                    return Err(ApiError::Cancelled);
                }
                result = exchange => result?,
            },
            None => exchange.await?,
        };

        let data: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        if !status.is_success() {
            let message = error_message(&data, &text, status);
            tracing::warn!(
                method = ?method,
                url = %url,
                status = %status,
                error = %message,
                "API request failed"
            );
            return Err(ApiError::Http { status, message });
        }

        Ok(data)
    }
}

/// Derive the display message for a failed response.
///
/// Preference order: `detail`, first of `non_field_errors`, the JSON text of
/// any other object or array, a bare JSON scalar, then the status text.
pub fn error_message(data: &Value, raw: &str, status: StatusCode) -> String {
    if let Some(detail) = data
        .get("detail")
        .and_then(Value::as_str)
        .filter(|d| !d.is_empty())
    {
        return detail.to_string();
    }

    if let Some(first) = data
        .get("non_field_errors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first())
    {
        match first {
            Value::String(s) if !s.is_empty() => return s.clone(),
            Value::Null | Value::String(_) => {}
            other => return other.to_string(),
        }
    }

    match data {
        Value::Object(_) | Value::Array(_) => return data.to_string(),
        Value::String(s) if !s.is_empty() => return s.clone(),
        Value::Number(n) => return n.to_string(),
        _ => {}
    }

    if let Some(reason) = status.canonical_reason() {
        return reason.to_string();
    }

    let raw = raw.trim();
    if raw.is_empty() {
        format!("HTTP {}", status.as_u16())
    } else {
        raw.to_string()
    }
}

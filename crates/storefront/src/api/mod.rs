//! Remote shop API boundary.
//!
//! # Architecture
//!
//! - Plain JSON-over-REST via `reqwest`; one shared client behind an
//!   `Arc`-inner handle
//! - The shop API sometimes paginates list responses (`{results: [...]}`)
//!   and sometimes returns bare arrays; [`Paged`] normalizes both in one
//!   place so call sites never branch on the shape
//! - Field-level validation errors from the server are carried verbatim in
//!   [`FieldErrors`] for display
//!
//! Authentication state does not live here: [`ApiClient`] attaches a bearer
//! token when it is handed one, and the session manager decides which token
//! that is and when to rotate it.

mod catalog;
mod orders;
pub mod types;

pub use catalog::{CatalogClient, ProductFilter};
pub use orders::OrdersClient;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::config::StorefrontConfig;

/// Errors that can occur when talking to the shop API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connection, timeout, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not decode as the expected shape.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Login was rejected (wrong email or password).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The operation requires a session but none is active.
    #[error("not authenticated")]
    NotAuthenticated,

    /// The server rejected the bearer token (HTTP 401).
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// The access token expired and could not be refreshed; the session has
    /// been cleared and the caller must treat the user as logged out.
    #[error("session expired")]
    SessionExpired,

    /// The server rejected the request with field-level validation errors.
    #[error("validation failed: {0}")]
    Validation(FieldErrors),

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Any other non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body for diagnostics.
        body: String,
    },
}

/// Field-level validation messages, keyed by field name.
///
/// Carried verbatim from the server so callers can display them next to the
/// offending input. Non-field messages arrive under `detail` or
/// `non_field_errors`, exactly as the server sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Build a one-field error, used for client-side validation failures.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut map = BTreeMap::new();
        map.insert(field.to_owned(), vec![message.into()]);
        Self(map)
    }

    /// Parse a server error body into field messages.
    ///
    /// The shop API emits JSON objects mapping field names to either a single
    /// message or a list of messages. Anything else is preserved under the
    /// `detail` key so no server text is ever dropped.
    #[must_use]
    pub fn from_body(body: &str) -> Self {
        let mut map = BTreeMap::new();

        match serde_json::from_str::<serde_json::Value>(body) {
            Ok(serde_json::Value::Object(fields)) => {
                for (field, value) in fields {
                    let messages = match value {
                        serde_json::Value::String(s) => vec![s],
                        serde_json::Value::Array(items) => items
                            .into_iter()
                            .map(|item| match item {
                                serde_json::Value::String(s) => s,
                                other => other.to_string(),
                            })
                            .collect(),
                        other => vec![other.to_string()],
                    };
                    map.insert(field, messages);
                }
            }
            _ => {
                map.insert("detail".to_owned(), vec![truncate(body, 200)]);
            }
        }

        Self(map)
    }

    /// Messages for one field, if any.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&[String]> {
        self.0.get(name).map(Vec::as_slice)
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        if first {
            write!(f, "(no details)")?;
        }
        Ok(())
    }
}

/// A list response that may or may not be paginated.
///
/// The shop API wraps some list endpoints in `{count, results: [...]}` and
/// serves others as bare arrays. Decoding through this type keeps the
/// coercion in one place.
#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum Paged<T> {
    /// Paginated shape: `{"results": [...]}`.
    Paginated {
        /// The current page of items.
        results: Vec<T>,
    },
    /// Bare array shape: `[...]`.
    Plain(Vec<T>),
}

impl<T> Paged<T> {
    /// Unwrap to the items regardless of shape.
    #[must_use]
    pub fn into_results(self) -> Vec<T> {
        match self {
            Self::Paginated { results } | Self::Plain(results) => results,
        }
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Low-level client for the shop API.
///
/// Owns the shared HTTP client and base URL, builds requests, and maps
/// response statuses into [`ApiError`]. Cheaply cloneable.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be constructed.
    pub fn new(config: &StorefrontConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                http,
                base_url: config.api_base_url.as_str().trim_end_matches('/').to_owned(),
            }),
        })
    }

    /// Start building a request for `path` (which must begin with `/`).
    pub(crate) fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.inner
            .http
            .request(method, format!("{}{path}", self.inner.base_url))
    }

    /// Build a request with a JSON body and optional bearer token.
    pub(crate) fn build<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        token: Option<&SecretString>,
    ) -> RequestBuilder {
        let mut builder = self.request(method, path);
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }
        builder
    }

    /// Send a request and decode the JSON response.
    ///
    /// # Errors
    ///
    /// Returns an [`ApiError`] describing transport, status, or decode
    /// failures.
    pub(crate) async fn execute<R: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<R, ApiError> {
        let text = self.execute_raw(builder).await?;

        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %truncate(&text, 500),
                    "failed to decode shop API response"
                );
                Err(ApiError::Parse(e))
            }
        }
    }

    /// Send a request and return the successful response body as text.
    pub(crate) async fn execute_raw(&self, builder: RequestBuilder) -> Result<String, ApiError> {
        let response = builder.send().await?;
        let status = response.status();

        // Read the body as text first for better error diagnostics
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        Err(error_for_status(status, &text))
    }
}

/// Map a non-success status and body into the error taxonomy.
fn error_for_status(status: StatusCode, body: &str) -> ApiError {
    match status {
        StatusCode::UNAUTHORIZED => ApiError::Unauthorized(detail_from(body)),
        StatusCode::NOT_FOUND => ApiError::NotFound(detail_from(body)),
        s if s.is_client_error() => ApiError::Validation(FieldErrors::from_body(body)),
        s => ApiError::Status {
            status: s.as_u16(),
            body: truncate(body, 200),
        },
    }
}

/// Extract the server's `detail` message, falling back to the raw body.
fn detail_from(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("detail").and_then(|d| d.as_str()).map(str::to_owned))
        .unwrap_or_else(|| truncate(body, 200))
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_paged_unwraps_paginated_shape() {
        let paged: Paged<u32> = serde_json::from_str(r#"{"count": 3, "results": [1, 2, 3]}"#).unwrap();
        assert_eq!(paged.into_results(), vec![1, 2, 3]);
    }

    #[test]
    fn test_paged_unwraps_bare_array() {
        let paged: Paged<u32> = serde_json::from_str("[4, 5]").unwrap();
        assert_eq!(paged.into_results(), vec![4, 5]);
    }

    #[test]
    fn test_field_errors_from_list_body() {
        let errors = FieldErrors::from_body(r#"{"email": ["Ya existe un usuario con este email."]}"#);
        assert_eq!(
            errors.field("email").unwrap(),
            ["Ya existe un usuario con este email."]
        );
    }

    #[test]
    fn test_field_errors_from_string_body() {
        let errors = FieldErrors::from_body(r#"{"password_confirm": "Las contraseñas no coinciden."}"#);
        assert_eq!(
            errors.field("password_confirm").unwrap(),
            ["Las contraseñas no coinciden."]
        );
    }

    #[test]
    fn test_field_errors_preserves_non_json_body() {
        let errors = FieldErrors::from_body("<html>bad gateway</html>");
        assert!(errors.field("detail").is_some());
    }

    #[test]
    fn test_field_errors_display() {
        let errors = FieldErrors::from_body(r#"{"email": ["taken"], "password": ["weak", "short"]}"#);
        assert_eq!(errors.to_string(), "email: taken; password: weak, short");
    }

    #[test]
    fn test_error_for_status_taxonomy() {
        assert!(matches!(
            error_for_status(StatusCode::UNAUTHORIZED, r#"{"detail": "nope"}"#),
            ApiError::Unauthorized(detail) if detail == "nope"
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_REQUEST, r#"{"email": ["taken"]}"#),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::NOT_FOUND, "{}"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            error_for_status(StatusCode::BAD_GATEWAY, "oops"),
            ApiError::Status { status: 502, .. }
        ));
    }

    #[test]
    fn test_api_error_display() {
        assert_eq!(ApiError::SessionExpired.to_string(), "session expired");
        assert_eq!(
            ApiError::NotFound("producto".to_string()).to_string(),
            "not found: producto"
        );
    }
}

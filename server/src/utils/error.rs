use std::fmt;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{error, warn};

use crate::utils::response::error as error_response;

/// Failure classes for calls to third-party APIs, surfaced to the UI as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamErrorKind {
    NotFound,
    RateLimited,
    ServerError,
    NetworkError,
}

impl UpstreamErrorKind {
    pub fn from_status(status: StatusCode) -> Self {
        match status {
            StatusCode::NOT_FOUND => UpstreamErrorKind::NotFound,
            StatusCode::TOO_MANY_REQUESTS => UpstreamErrorKind::RateLimited,
            _ => UpstreamErrorKind::ServerError,
        }
    }

    /// Whether a retry has any chance of succeeding.
    pub fn is_transient(self) -> bool {
        !matches!(self, UpstreamErrorKind::NotFound)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            UpstreamErrorKind::NotFound => "not_found",
            UpstreamErrorKind::RateLimited => "rate_limited",
            UpstreamErrorKind::ServerError => "server_error",
            UpstreamErrorKind::NetworkError => "network_error",
        }
    }

    fn status_code(self) -> StatusCode {
        match self {
            UpstreamErrorKind::NotFound => StatusCode::NOT_FOUND,
            UpstreamErrorKind::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            UpstreamErrorKind::ServerError => StatusCode::BAD_GATEWAY,
            UpstreamErrorKind::NetworkError => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl fmt::Display for UpstreamErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("{service} request failed ({kind}): {message}")]
pub struct UpstreamError {
    pub service: &'static str,
    pub kind: UpstreamErrorKind,
    pub status: Option<u16>,
    pub message: String,
}

impl UpstreamError {
    pub fn new(service: &'static str, kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            service,
            kind,
            status: None,
            message: message.into(),
        }
    }

    pub fn from_status(service: &'static str, status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            service,
            kind: UpstreamErrorKind::from_status(status),
            status: Some(status.as_u16()),
            message: body.into(),
        }
    }

    pub fn network(service: &'static str, err: reqwest::Error) -> Self {
        Self::new(service, UpstreamErrorKind::NetworkError, err.to_string())
    }

    pub fn decode(service: &'static str, err: impl fmt::Display) -> Self {
        Self::new(
            service,
            UpstreamErrorKind::ServerError,
            format!("unexpected response body: {err}"),
        )
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Authentication error: {0}")]
    AuthError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("Service not configured: {0}")]
    NotConfigured(String),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::AuthError(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Upstream(e) => e.kind.status_code(),
            AppError::NotConfigured(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) => "VALIDATION_ERROR",
            AppError::AuthError(_) => "AUTH_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Upstream(_) => "EXTERNAL_SERVICE_ERROR",
            AppError::NotConfigured(_) => "NOT_CONFIGURED",
        }
    }

    fn log(&self) {
        match self {
            AppError::ValidationError(msg) | AppError::AuthError(msg) | AppError::NotFound(msg) => {
                warn!(code = self.code(), message = %msg, "Request rejected");
            }
            AppError::Upstream(e) => {
                error!(
                    service = e.service,
                    kind = %e.kind,
                    status = ?e.status,
                    message = %e.message,
                    "Upstream error"
                );
            }
            AppError::NotConfigured(msg) => {
                error!(error = ?self, message = %msg, "Application error");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();

        self.log();

        // Upstream bodies can leak credentials or internals; only the kind goes out.
        let (public_message, details) = match &self {
            AppError::ValidationError(msg)
            | AppError::AuthError(msg)
            | AppError::NotFound(msg)
            | AppError::NotConfigured(msg) => (msg.clone(), None),
            AppError::Upstream(e) => (
                format!("{} is currently unavailable", e.service),
                Some(json!({ "kind": e.kind })),
            ),
        };

        error_response(code, public_message, details, status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(
            UpstreamErrorKind::from_status(StatusCode::NOT_FOUND),
            UpstreamErrorKind::NotFound
        );
        assert_eq!(
            UpstreamErrorKind::from_status(StatusCode::TOO_MANY_REQUESTS),
            UpstreamErrorKind::RateLimited
        );
        assert_eq!(
            UpstreamErrorKind::from_status(StatusCode::BAD_GATEWAY),
            UpstreamErrorKind::ServerError
        );
        assert_eq!(
            UpstreamErrorKind::from_status(StatusCode::UNAUTHORIZED),
            UpstreamErrorKind::ServerError
        );
    }

    #[test]
    fn test_not_found_is_not_transient() {
        assert!(!UpstreamErrorKind::NotFound.is_transient());
        assert!(UpstreamErrorKind::RateLimited.is_transient());
        assert!(UpstreamErrorKind::NetworkError.is_transient());
    }

    #[test]
    fn test_upstream_status_mapping() {
        let err = AppError::from(UpstreamError::from_status(
            "Contentstack",
            StatusCode::TOO_MANY_REQUESTS,
            "slow down",
        ));
        assert_eq!(err.status_code(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(err.code(), "EXTERNAL_SERVICE_ERROR");

        let err = AppError::from(UpstreamError::new(
            "Algolia",
            UpstreamErrorKind::NetworkError,
            "connection refused",
        ));
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_kind_serializes_snake_case() {
        let value = serde_json::to_value(UpstreamErrorKind::RateLimited).unwrap();
        assert_eq!(value, "rate_limited");
    }
}

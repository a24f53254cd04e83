/// Error handling for the athena_web API
///
/// This module provides:
/// - The JSON error body shared by every endpoint
/// - The `IntoErrorResponse` trait mapping domain errors to HTTP statuses
/// - Recovery of warp rejections into the same error body
/// - Severity-based error logging
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use warp::http::StatusCode;
use warp::reply::{self, Response};
use warp::{Rejection, Reply};

/// Standard error response format for all API endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "ruleset_not_found")
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (structured data)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }

    /// Convert to HTTP response with specified status code
    pub fn into_response(self, status: StatusCode) -> Response {
        reply::with_status(reply::json(&self), status).into_response()
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Client errors (4xx) - expected, normal operation
    Client,
    /// Server errors (5xx) - unexpected, needs investigation
    Server,
    /// Critical errors - system integrity at risk
    Critical,
}

/// Trait for converting errors to HTTP responses with proper logging
pub trait IntoErrorResponse {
    fn status_code(&self) -> StatusCode;

    /// Machine-readable error code
    fn error_code(&self) -> &'static str;

    /// Human-readable error message
    fn error_message(&self) -> String;

    fn error_details(&self) -> Option<serde_json::Value> {
        None
    }

    fn severity(&self) -> ErrorSeverity {
        if self.status_code().is_server_error() {
            ErrorSeverity::Server
        } else {
            ErrorSeverity::Client
        }
    }

    fn to_error_response(&self) -> ErrorResponse {
        if let Some(details) = self.error_details() {
            ErrorResponse::with_details(self.error_code(), self.error_message(), details)
        } else {
            ErrorResponse::new(self.error_code(), self.error_message())
        }
    }

    /// Convert to HTTP response, logging according to severity
    fn into_http_response(self) -> Response
    where
        Self: Sized,
    {
        let status = self.status_code();
        let error_response = self.to_error_response();
        log_error(self.severity(), &error_response);
        error_response.into_response(status)
    }
}

fn log_error(severity: ErrorSeverity, error: &ErrorResponse) {
    match severity {
        ErrorSeverity::Client => {
            tracing::info!(code = %error.error, message = %error.message, "client error");
        }
        ErrorSeverity::Server => {
            tracing::error!(code = %error.error, message = %error.message, "server error");
        }
        ErrorSeverity::Critical => {
            tracing::error!(
                code = %error.error,
                message = %error.message,
                critical = true,
                "critical error"
            );
        }
    }
}

/// Turns a warp rejection into the standard error body.
///
/// Handlers never reject on their own, so what arrives here is a routing or
/// body-decoding failure.
pub async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    let (status, error) = if err.is_not_found() {
        (
            StatusCode::NOT_FOUND,
            ErrorResponse::new("not_found", "no such route"),
        )
    } else if let Some(body) = err.find::<warp::filters::body::BodyDeserializeError>() {
        (
            StatusCode::BAD_REQUEST,
            ErrorResponse::new("invalid_body", body.to_string()),
        )
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ErrorResponse::new("unsupported_media_type", "expected application/json"),
        )
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        (
            StatusCode::PAYLOAD_TOO_LARGE,
            ErrorResponse::new("payload_too_large", "request body too large"),
        )
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        (
            StatusCode::METHOD_NOT_ALLOWED,
            ErrorResponse::new("method_not_allowed", "method not allowed"),
        )
    } else {
        tracing::error!(rejection = ?err, "unhandled rejection");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorResponse::new("internal_error", "internal server error"),
        )
    };

    Ok(error.into_response(status))
}

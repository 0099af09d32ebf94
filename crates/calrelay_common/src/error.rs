// --- File: crates/calrelay_common/src/error.rs ---
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// The base error type surfaced to HTTP callers.
///
/// Each crate keeps its own error enum and converts into this one at the
/// handler boundary via `From`.
#[derive(Error, Debug)]
pub enum RelayError {
    /// A required input field is missing or malformed. The caller's fault.
    #[error("{0}")]
    ValidationError(String),

    /// An external service was unreachable or answered with a failure.
    #[error("{message}")]
    UpstreamError {
        service_name: String,
        message: String,
        /// Structured error body from the service, echoed to the caller.
        details: Option<Value>,
    },

    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The payment gate refused the request.
    #[error("Payment required: {0}")]
    PaymentRequired(String),

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for RelayError {
    fn status_code(&self) -> u16 {
        match self {
            RelayError::ValidationError(_) => 400,
            RelayError::UpstreamError { .. } => 500,
            RelayError::ConfigError(_) => 500,
            RelayError::PaymentRequired(_) => 402,
            RelayError::InternalError(_) => 500,
        }
    }
}

impl RelayError {
    /// Replaces the caller-facing message of an upstream failure, keeping
    /// what went wrong in `details`.
    ///
    /// When the service sent no structured body, the previous message becomes
    /// the details. Other variants are returned unchanged.
    pub fn in_context<C: fmt::Display>(self, context: C) -> RelayError {
        match self {
            RelayError::UpstreamError {
                service_name,
                message,
                details,
            } => RelayError::UpstreamError {
                service_name,
                message: context.to_string(),
                details: details.or(Some(Value::String(message))),
            },
            other => other,
        }
    }

    /// Structured details attached to the error, if any.
    pub fn details(&self) -> Option<&Value> {
        match self {
            RelayError::UpstreamError { details, .. } => details.as_ref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(err: reqwest::Error) -> Self {
        upstream_error("http", err)
    }
}

// Utility functions for error handling
pub fn config_error<T: fmt::Display>(message: T) -> RelayError {
    RelayError::ConfigError(message.to_string())
}

pub fn validation_error<T: fmt::Display>(message: T) -> RelayError {
    RelayError::ValidationError(message.to_string())
}

pub fn upstream_error<T: fmt::Display>(service_name: &str, message: T) -> RelayError {
    RelayError::UpstreamError {
        service_name: service_name.to_string(),
        message: message.to_string(),
        details: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_codes() {
        assert_eq!(validation_error("x").status_code(), 400);
        assert_eq!(upstream_error("Cal.com", "x").status_code(), 500);
        assert_eq!(RelayError::PaymentRequired("x".into()).status_code(), 402);
        assert_eq!(config_error("x").status_code(), 500);
    }

    #[test]
    fn test_in_context_moves_message_into_details() {
        let err = upstream_error("Cal.com", "connection refused").in_context("Failed to fetch slots");

        assert_eq!(err.to_string(), "Failed to fetch slots");
        assert_eq!(err.details(), Some(&json!("connection refused")));
    }

    #[test]
    fn test_in_context_keeps_provider_payload() {
        let err = RelayError::UpstreamError {
            service_name: "Cal.com".into(),
            message: "Cal.com returned 400".into(),
            details: Some(json!({"status": "error", "error": {"message": "slot taken"}})),
        }
        .in_context("Failed to book meeting");

        assert_eq!(err.to_string(), "Failed to book meeting");
        assert_eq!(err.details().unwrap()["error"]["message"], "slot taken");
    }

    #[test]
    fn test_in_context_leaves_validation_alone() {
        let err = validation_error("Username is required").in_context("ignored");
        assert_eq!(err.to_string(), "Username is required");
        assert!(err.details().is_none());
    }
}

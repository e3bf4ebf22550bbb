// ABOUTME: Error codes and the service error returned by external facade calls
// ABOUTME: Maps network, HTTP status, and decoding failures onto stable error codes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Service Errors
//!
//! Every call into the external service facade fails with a [`ServiceError`].
//! The error is opaque beyond its code and message: flows never branch on the
//! cause, they only forward it inside a failure notification.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    // Authentication & Authorization (1000-1999)
    #[serde(rename = "AUTH_REQUIRED")]
    AuthRequired = 1000,
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid = 1001,
    #[serde(rename = "ACCESS_DENIED")]
    AccessDenied = 1004,

    // Rate Limiting (2000-2999)
    #[serde(rename = "RATE_LIMIT_EXCEEDED")]
    RateLimitExceeded = 2000,

    // Validation (3000-3999)
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput = 3000,
    #[serde(rename = "INVALID_FORMAT")]
    InvalidFormat = 3002,

    // External Services (5000-5999)
    #[serde(rename = "EXTERNAL_SERVICE_ERROR")]
    ExternalServiceError = 5000,
    #[serde(rename = "EXTERNAL_SERVICE_UNAVAILABLE")]
    ExternalServiceUnavailable = 5001,
    #[serde(rename = "NETWORK_FAILURE")]
    NetworkFailure = 5004,

    // Configuration (6000-6999)
    #[serde(rename = "CONFIG_MISSING")]
    ConfigMissing = 6001,
    #[serde(rename = "CONFIG_INVALID")]
    ConfigInvalid = 6002,

    // Internal Errors (9000-9999)
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError = 9000,
    #[serde(rename = "SERIALIZATION_ERROR")]
    SerializationError = 9003,
}

impl ErrorCode {
    /// Get a user-friendly description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthRequired => "Authentication is required to access this resource",
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::AccessDenied => "The user declined the authorization request",
            Self::RateLimitExceeded => "Rate limit exceeded. Please slow down your requests",
            Self::InvalidInput => "The provided input is invalid",
            Self::InvalidFormat => "The data format is invalid",
            Self::ExternalServiceError => "An external service encountered an error",
            Self::ExternalServiceUnavailable => "An external service is currently unavailable",
            Self::NetworkFailure => "The external service could not be reached",
            Self::ConfigMissing => "Required configuration is missing",
            Self::ConfigInvalid => "Configuration is invalid",
            Self::InternalError => "An internal error occurred",
            Self::SerializationError => "Data serialization/deserialization failed",
        }
    }

    /// Whether retrying the same call later may succeed
    #[must_use]
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::RateLimitExceeded | Self::ExternalServiceUnavailable | Self::NetworkFailure
        )
    }
}

/// Failure of a single external service call
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{code:?}: {message}")]
pub struct ServiceError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

/// Result alias for facade calls
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Create a new error with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The service could not be reached (DNS, connect, timeout)
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NetworkFailure, message)
    }

    /// The service answered with a failure status
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        let code = match status {
            401 => ErrorCode::AuthInvalid,
            403 => ErrorCode::AccessDenied,
            429 => ErrorCode::RateLimitExceeded,
            500..=599 => ErrorCode::ExternalServiceUnavailable,
            _ => ErrorCode::ExternalServiceError,
        };
        Self::new(code, format!("HTTP {status}: {}", message.into()))
    }

    /// The service answered with a body that could not be decoded
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::SerializationError, message)
    }

    /// The service rejected the call because a rate limit window is exhausted
    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RateLimitExceeded, message)
    }

    /// The input handed to the facade was malformed
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// The call needs a token the client does not hold
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthRequired, message)
    }

    /// Required configuration is missing
    pub fn config_missing(key: &str) -> Self {
        Self::new(ErrorCode::ConfigMissing, format!("missing configuration: {key}"))
    }
}

#[cfg(feature = "provider-errors")]
impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::network(err.to_string())
        } else if err.is_decode() {
            Self::invalid_response(err.to_string())
        } else if let Some(status) = err.status() {
            Self::service(status.as_u16(), err.to_string())
        } else {
            Self::new(ErrorCode::ExternalServiceError, err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ServiceError::service(401, "x").code, ErrorCode::AuthInvalid);
        assert_eq!(
            ServiceError::service(429, "x").code,
            ErrorCode::RateLimitExceeded
        );
        assert_eq!(
            ServiceError::service(503, "x").code,
            ErrorCode::ExternalServiceUnavailable
        );
        assert_eq!(
            ServiceError::service(404, "x").code,
            ErrorCode::ExternalServiceError
        );
    }

    #[test]
    fn test_transient_codes() {
        assert!(ErrorCode::NetworkFailure.is_transient());
        assert!(!ErrorCode::AccessDenied.is_transient());
    }

    #[test]
    fn test_serialized_code_name() {
        let err = ServiceError::network("offline");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "NETWORK_FAILURE");
        assert_eq!(json["message"], "offline");
    }
}

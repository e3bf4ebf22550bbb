// ABOUTME: Flow error taxonomy carried inside failure notifications
// ABOUTME: Distinguishes cancellation, access denial, ignored links, service and validation failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Flow Errors
//!
//! Every failure a flow observes is converted into a [`FlowError`] and emitted
//! inside the flow's failure notification. No error crosses the flow boundary
//! as a raw fault.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use stravels_core::errors::{ErrorCode, ServiceError, ServiceResult};

/// Failure observed by an orchestration flow
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum FlowError {
    /// The deep-link channel was read after it was closed
    #[error("deep link channel closed")]
    ChannelClosed,

    /// The athlete declined the authorization
    #[error("authorization denied by the athlete")]
    AccessDenied,

    /// A deep link that does not belong to the OAuth redirect
    #[error("deep link does not match the redirect URI")]
    Ignored,

    /// An external service call failed
    #[error("service call failed: {0}")]
    Service(#[from] ServiceError),

    /// The redirect payload reaching the exchange step was malformed
    #[error("invalid redirect payload: {0}")]
    Validation(String),

    /// No redirect arrived before the configured deadline
    #[error("no authorization redirect received within {after_secs}s")]
    RedirectTimeout {
        /// Deadline that expired, in seconds
        after_secs: u64,
    },
}

impl FlowError {
    /// Classify a failure of the redirect exchange step
    #[must_use]
    pub fn from_exchange(err: ServiceError) -> Self {
        match err.code {
            ErrorCode::AccessDenied => Self::AccessDenied,
            ErrorCode::InvalidInput | ErrorCode::InvalidFormat => Self::Validation(err.message),
            _ => Self::Service(err),
        }
    }

    /// Whether the UI should surface this error to the athlete
    #[must_use]
    pub const fn is_user_visible(&self) -> bool {
        !matches!(self, Self::ChannelClosed | Self::Ignored)
    }

    /// Stable error code for logs and serialized state
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::ChannelClosed => ErrorCode::InternalError,
            Self::AccessDenied => ErrorCode::AccessDenied,
            Self::Ignored | Self::Validation(_) => ErrorCode::InvalidInput,
            Self::Service(err) => err.code,
            Self::RedirectTimeout { .. } => ErrorCode::ExternalServiceUnavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_exchange_error_classification() {
        assert_eq!(
            FlowError::from_exchange(ServiceError::new(ErrorCode::AccessDenied, "no")),
            FlowError::AccessDenied
        );
        assert_eq!(
            FlowError::from_exchange(ServiceError::validation("no code")),
            FlowError::Validation("no code".to_owned())
        );
        let network = ServiceError::network("offline");
        assert_eq!(
            FlowError::from_exchange(network.clone()),
            FlowError::Service(network)
        );
    }

    #[test]
    fn test_visibility() {
        assert!(!FlowError::ChannelClosed.is_user_visible());
        assert!(!FlowError::Ignored.is_user_visible());
        assert!(FlowError::AccessDenied.is_user_visible());
        assert_eq!(
            FlowError::RedirectTimeout { after_secs: 5 }.code(),
            ErrorCode::ExternalServiceUnavailable
        );
    }

    #[test]
    fn test_serialized_shape() {
        let json = serde_json::to_value(FlowError::AccessDenied).unwrap();
        assert_eq!(json["kind"], "access_denied");
        let json = serde_json::to_value(FlowError::Validation("bad".to_owned())).unwrap();
        assert_eq!(json["detail"], "bad");
    }
}

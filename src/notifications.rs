// ABOUTME: Typed state-change notifications, triggering requests, and the action sink contract
// ABOUTME: One request/success/failure notification per flow kind, consumed by the state layer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;
use tracing::debug;

use crate::errors::FlowError;
use crate::flows::FlowKind;
use stravels_core::models::{AccessToken, AthleteProfile, AuthorizationCode, ResourceKind};

/// Page used when a fetch request carries none
pub const DEFAULT_PAGE: u32 = 0;

/// State-change notification emitted for a flow transition
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    /// An authorization was requested
    AuthorizeRequested,
    /// The redirect delivered an authorization code
    AuthorizeSucceeded {
        /// Authorization code
        code: AuthorizationCode,
    },
    /// The authorization failed
    AuthorizeFailed {
        /// Cause
        error: FlowError,
    },
    /// A token exchange was requested for `code`
    TokenExchangeRequested {
        /// Authorization code to exchange
        code: AuthorizationCode,
    },
    /// The code was exchanged for a token
    TokenExchangeSucceeded {
        /// Bearer token
        token: AccessToken,
        /// Authorizing athlete
        user: AthleteProfile,
    },
    /// The token exchange failed
    TokenExchangeFailed {
        /// Cause
        error: FlowError,
    },
    /// A logout was requested
    LogoutRequested,
    /// The remote session was invalidated
    LogoutSucceeded,
    /// The logout failed; local session state is untouched
    LogoutFailed {
        /// Cause
        error: FlowError,
    },
    /// A previously issued token was adopted
    Login {
        /// Bearer token
        token: AccessToken,
    },
    /// The profile of the token's athlete was loaded
    SetUser {
        /// Authenticated athlete
        user: AthleteProfile,
    },
    /// A page of `kind` was requested
    FetchRequested {
        /// Resource
        kind: ResourceKind,
        /// Zero-based page
        page: u32,
    },
    /// A page of `kind` arrived
    FetchSucceeded {
        /// Resource
        kind: ResourceKind,
        /// Zero-based page
        page: u32,
        /// Page payload
        payload: serde_json::Value,
    },
    /// Fetching a page of `kind` failed
    FetchFailed {
        /// Resource
        kind: ResourceKind,
        /// Zero-based page
        page: u32,
        /// Cause
        error: FlowError,
    },
}

impl Notification {
    /// Action name, e.g. `AuthorizeSucceeded` or `ActivitiesFetchFailed`
    #[must_use]
    pub fn name(&self) -> String {
        let fetch = |kind: &ResourceKind, outcome: &str| {
            let resource = match kind {
                ResourceKind::Activities => "Activities",
                ResourceKind::Connections => "Connections",
            };
            format!("{resource}Fetch{outcome}")
        };
        match self {
            Self::AuthorizeRequested => "AuthorizeRequested".to_owned(),
            Self::AuthorizeSucceeded { .. } => "AuthorizeSucceeded".to_owned(),
            Self::AuthorizeFailed { .. } => "AuthorizeFailed".to_owned(),
            Self::TokenExchangeRequested { .. } => "TokenExchangeRequested".to_owned(),
            Self::TokenExchangeSucceeded { .. } => "TokenExchangeSucceeded".to_owned(),
            Self::TokenExchangeFailed { .. } => "TokenExchangeFailed".to_owned(),
            Self::LogoutRequested => "LogoutRequested".to_owned(),
            Self::LogoutSucceeded => "LogoutSucceeded".to_owned(),
            Self::LogoutFailed { .. } => "LogoutFailed".to_owned(),
            Self::Login { .. } => "Login".to_owned(),
            Self::SetUser { .. } => "SetUser".to_owned(),
            Self::FetchRequested { kind, .. } => fetch(kind, "Requested"),
            Self::FetchSucceeded { kind, .. } => fetch(kind, "Succeeded"),
            Self::FetchFailed { kind, .. } => fetch(kind, "Failed"),
        }
    }

    /// Flow kind this notification belongs to; `None` for session restore
    #[must_use]
    pub const fn flow_kind(&self) -> Option<FlowKind> {
        match self {
            Self::AuthorizeRequested
            | Self::AuthorizeSucceeded { .. }
            | Self::AuthorizeFailed { .. } => Some(FlowKind::Authorize),
            Self::TokenExchangeRequested { .. }
            | Self::TokenExchangeSucceeded { .. }
            | Self::TokenExchangeFailed { .. } => Some(FlowKind::TokenExchange),
            Self::LogoutRequested | Self::LogoutSucceeded | Self::LogoutFailed { .. } => {
                Some(FlowKind::Logout)
            }
            Self::FetchRequested { kind, .. }
            | Self::FetchSucceeded { kind, .. }
            | Self::FetchFailed { kind, .. } => Some(FlowKind::Fetch(*kind)),
            Self::Login { .. } | Self::SetUser { .. } => None,
        }
    }

    /// Whether this notification ends a flow
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(
            self,
            Self::AuthorizeRequested
                | Self::TokenExchangeRequested { .. }
                | Self::LogoutRequested
                | Self::FetchRequested { .. }
                | Self::Login { .. }
                | Self::SetUser { .. }
        )
    }

    /// Error carried by a failure notification
    #[must_use]
    pub const fn error(&self) -> Option<&FlowError> {
        match self {
            Self::AuthorizeFailed { error }
            | Self::TokenExchangeFailed { error }
            | Self::LogoutFailed { error }
            | Self::FetchFailed { error, .. } => Some(error),
            _ => None,
        }
    }
}

/// Request that starts a flow
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Start the OAuth authorization
    Authorize,
    /// Exchange `code` for a token
    TokenExchange {
        /// Authorization code
        code: AuthorizationCode,
    },
    /// Invalidate the session
    Logout,
    /// Fetch a page of `kind`, page 0 when absent
    Fetch {
        /// Resource
        kind: ResourceKind,
        /// Zero-based page
        page: Option<u32>,
    },
}

impl Request {
    /// Fetch a page of activities
    #[must_use]
    pub const fn activities(page: Option<u32>) -> Self {
        Self::Fetch {
            kind: ResourceKind::Activities,
            page,
        }
    }

    /// Fetch a page of connections
    #[must_use]
    pub const fn connections(page: Option<u32>) -> Self {
        Self::Fetch {
            kind: ResourceKind::Connections,
            page,
        }
    }

    /// Exchange `code` for a token
    pub fn token_exchange(code: impl Into<AuthorizationCode>) -> Self {
        Self::TokenExchange { code: code.into() }
    }

    /// Flow kind this request starts
    #[must_use]
    pub const fn flow_kind(&self) -> FlowKind {
        match self {
            Self::Authorize => FlowKind::Authorize,
            Self::TokenExchange { .. } => FlowKind::TokenExchange,
            Self::Logout => FlowKind::Logout,
            Self::Fetch { kind, .. } => FlowKind::Fetch(*kind),
        }
    }

    /// The `...Requested` notification announcing this request
    #[must_use]
    pub fn notification(&self) -> Notification {
        match self {
            Self::Authorize => Notification::AuthorizeRequested,
            Self::TokenExchange { code } => Notification::TokenExchangeRequested { code: code.clone() },
            Self::Logout => Notification::LogoutRequested,
            Self::Fetch { kind, page } => Notification::FetchRequested {
                kind: *kind,
                page: page.unwrap_or(DEFAULT_PAGE),
            },
        }
    }
}

/// Receiver of notifications, implemented by the state layer
///
/// `dispatch` is called synchronously from flow tasks and from the runtime
/// while it holds its registry lock; implementations must not block on the
/// runtime. Duplicate terminal notifications must be applied idempotently.
pub trait ActionSink: Send + Sync {
    /// Apply one notification
    fn dispatch(&self, notification: Notification);
}

/// Shared handle to a sink
pub type SharedSink = Arc<dyn ActionSink>;

/// Sink forwarding every notification to several sinks in order
pub struct FanOutSink {
    sinks: Vec<SharedSink>,
}

impl FanOutSink {
    /// Forward to `sinks`
    #[must_use]
    pub fn new(sinks: Vec<SharedSink>) -> Self {
        Self { sinks }
    }
}

impl ActionSink for FanOutSink {
    fn dispatch(&self, notification: Notification) {
        if let Some((last, rest)) = self.sinks.split_last() {
            for sink in rest {
                sink.dispatch(notification.clone());
            }
            last.dispatch(notification);
        }
    }
}

/// Sink that only logs notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl ActionSink for TracingSink {
    fn dispatch(&self, notification: Notification) {
        match notification.error() {
            Some(error) => debug!(action = %notification.name(), error = %error, "notification"),
            None => debug!(action = %notification.name(), "notification"),
        }
    }
}

// ABOUTME: Cancellable orchestration flows and the context they emit notifications through
// ABOUTME: Flow trait, flow kinds, outcomes, and the cancellation gate guarding terminal notifications
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Flows
//!
//! A flow drives one logical operation (authorize, token exchange, logout,
//! paginated fetch) to completion or failure. Flows suspend only while waiting
//! on a deep-link event or an external call.
//!
//! ## Cancellation
//!
//! Each flow runs behind a [`FlowGate`]. Cancelling the gate wakes the flow's
//! cancellation branch, which drops the flow future in place; resources the
//! flow owns (its deep-link channel) are released by their `Drop` before the
//! task finishes. The gate also serializes the terminal notification against
//! cancellation: a flow whose gate was cancelled can no longer emit.

/// OAuth authorization through the deep-link redirect
pub mod authorize;
/// Paginated resource fetches
pub mod fetch;
/// Session invalidation
pub mod logout;
/// Authorization code to token exchange
pub mod token_exchange;

pub use authorize::{AuthorizeFlow, AuthorizeSettings, AuthorizeState};
pub use fetch::PaginatedFetchFlow;
pub use logout::LogoutFlow;
pub use token_exchange::TokenExchangeFlow;

use async_trait::async_trait;
use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio_util::sync::CancellationToken;

use crate::notifications::{Notification, SharedSink};
use stravels_core::models::ResourceKind;

/// Kind of flow, used for scheduling policy and logs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowKind {
    /// [`AuthorizeFlow`]
    Authorize,
    /// [`TokenExchangeFlow`]
    TokenExchange,
    /// [`LogoutFlow`]
    Logout,
    /// [`PaginatedFetchFlow`] for one resource
    Fetch(ResourceKind),
}

impl fmt::Display for FlowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authorize => f.write_str("authorize"),
            Self::TokenExchange => f.write_str("token_exchange"),
            Self::Logout => f.write_str("logout"),
            Self::Fetch(kind) => write!(f, "fetch_{kind}"),
        }
    }
}

/// Identifier of one flow instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowId(pub u64);

impl FlowId {
    /// Allocate a process-unique id
    #[must_use]
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for FlowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "flow-{}", self.0)
    }
}

/// How a flow ended
#[derive(Debug, Clone, PartialEq)]
pub enum FlowOutcome {
    /// The flow emitted this terminal notification
    Completed(Notification),
    /// The flow was cancelled or superseded and emitted nothing
    Cancelled,
}

impl FlowOutcome {
    /// Terminal notification, if one was emitted
    #[must_use]
    pub const fn notification(&self) -> Option<&Notification> {
        match self {
            Self::Completed(notification) => Some(notification),
            Self::Cancelled => None,
        }
    }

    /// Whether the flow completed with a success notification
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.notification()
            .is_some_and(|n| n.is_terminal() && n.error().is_none())
    }

    /// Whether the flow was cancelled
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GateState {
    Running,
    Cancelled,
    Finished,
}

/// Cancellation switch of one flow instance
#[derive(Debug)]
pub struct FlowGate {
    state: Mutex<GateState>,
    token: CancellationToken,
}

impl Default for FlowGate {
    fn default() -> Self {
        Self::new()
    }
}

impl FlowGate {
    /// A running gate
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Mutex::new(GateState::Running),
            token: CancellationToken::new(),
        }
    }

    /// Cancel the flow; returns `false` if it already finished or was cancelled
    pub fn cancel(&self) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != GateState::Running {
            return false;
        }
        *state = GateState::Cancelled;
        self.token.cancel();
        true
    }

    /// Whether the flow was cancelled
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) == GateState::Cancelled
    }

    /// Emit the terminal notification unless the flow was cancelled
    fn finish(&self, sink: &SharedSink, notification: Notification) -> FlowOutcome {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if *state != GateState::Running {
            return FlowOutcome::Cancelled;
        }
        *state = GateState::Finished;
        sink.dispatch(notification.clone());
        FlowOutcome::Completed(notification)
    }
}

/// Everything a running flow may touch besides its own collaborators
#[derive(Clone)]
pub struct FlowContext {
    id: FlowId,
    sink: SharedSink,
    gate: Arc<FlowGate>,
}

impl FlowContext {
    /// Context with a fresh gate, for running a flow outside the runtime
    #[must_use]
    pub fn new(sink: SharedSink) -> Self {
        Self::with_gate(FlowId::next(), sink, Arc::new(FlowGate::new()))
    }

    /// Context bound to an existing gate
    #[must_use]
    pub const fn with_gate(id: FlowId, sink: SharedSink, gate: Arc<FlowGate>) -> Self {
        Self { id, sink, gate }
    }

    /// Flow instance id
    #[must_use]
    pub const fn id(&self) -> FlowId {
        self.id
    }

    /// Gate controlling this flow
    #[must_use]
    pub const fn gate(&self) -> &Arc<FlowGate> {
        &self.gate
    }

    /// Emit the terminal notification and end the flow
    ///
    /// Returns [`FlowOutcome::Cancelled`] without emitting when the gate was
    /// cancelled first.
    #[must_use]
    pub fn finish(&self, notification: Notification) -> FlowOutcome {
        self.gate.finish(&self.sink, notification)
    }

    /// Drive `flow` until it completes or the gate is cancelled
    ///
    /// On cancellation `flow` is dropped before this returns, so its cleanup
    /// has run by the time the caller observes [`FlowOutcome::Cancelled`].
    pub async fn run_cancellable<F>(&self, flow: F) -> FlowOutcome
    where
        F: Future<Output = FlowOutcome>,
    {
        tokio::select! {
            biased;
            () = self.gate.token.cancelled() => FlowOutcome::Cancelled,
            outcome = flow => outcome,
        }
    }
}

/// One orchestration use case
#[async_trait]
pub trait Flow: Send + Sync {
    /// Kind of this flow
    fn kind(&self) -> FlowKind;

    /// Run to completion, emitting exactly one terminal notification through
    /// `ctx` unless cancelled
    async fn run(&self, ctx: &FlowContext) -> FlowOutcome;
}

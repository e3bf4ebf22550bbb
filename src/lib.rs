// ABOUTME: Main library entry point for the Stravels authorization and sync orchestrator
// ABOUTME: Cancellable flows over a deep-link channel, the Strava facade, and a notification sink
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Stravels
//!
//! Asynchronous authorization and data-synchronization orchestrator for a
//! Strava client. A small set of cancellable flows coordinates the
//! redirect-based OAuth handshake, the token exchange, session teardown and
//! paginated fetches, emitting one typed notification per transition.
//!
//! ## Architecture
//!
//! - **Channel**: closeable single-consumer queue over the platform's deep-link listeners
//! - **Flows**: authorize, token exchange, logout and paginated fetch
//! - **Runtime**: starts flows for requests and cancels superseded ones
//! - **Session**: reducer and store turning notifications into session state
//! - **Providers**: the external service facade and its Strava implementation
//!   (`stravels-providers` crate)
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use stravels::linking::LinkingHub;
//! use stravels::notifications::Request;
//! use stravels::runtime::{Runtime, RuntimeOptions};
//! use stravels::session::SessionStore;
//! use stravels_providers::{StravaClient, StravaClientConfig};
//!
//! # async fn run() {
//! let store = Arc::new(SessionStore::new());
//! let runtime = Runtime::new(
//!     Arc::new(StravaClient::new(StravaClientConfig::default())),
//!     Arc::new(LinkingHub::new()),
//!     store.clone(),
//!     RuntimeOptions::default(),
//! );
//! let outcome = runtime.dispatch(Request::activities(None)).wait().await;
//! println!("{outcome:?} {:?}", store.phase());
//! # }
//! ```

/// Deep-link event channel and the listener source contract
pub mod channel;

/// Configuration loaded from the environment
pub mod config;

/// Flow error taxonomy
pub mod errors;

/// Orchestration flows and their cancellation gate
pub mod flows;

/// In-process deep-link source
pub mod linking;

/// Structured logging setup
pub mod logging;

/// Notifications, triggering requests, and the action sink contract
pub mod notifications;

/// Flow scheduler
pub mod runtime;

/// Session reducer and observable store
pub mod session;

/// Test doubles for the facade and the sink
#[cfg(any(test, feature = "testing"))]
pub mod test_utils;

pub use channel::{DeepLinkSource, EventChannel};
pub use errors::FlowError;
pub use flows::{Flow, FlowContext, FlowId, FlowKind, FlowOutcome};
pub use notifications::{ActionSink, Notification, Request};
pub use runtime::{FlowTicket, Runtime, RuntimeOptions};
pub use session::{Phase, SessionStore};

// ABOUTME: Session state store applying flow notifications through a pure reducer
// ABOUTME: Publishes snapshots over a watch channel and exposes session selectors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Session Store
//!
//! [`reduce`] is the single place where notifications change state. It keeps
//! two invariants: `LoggedIn` always carries a token and a user, and every
//! failure of the login sequence falls back to `LoggedOut` with neither.
//! Applying the same terminal notification twice yields the same state.

use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::watch;
use tracing::debug;

use crate::errors::FlowError;
use crate::flows::FlowKind;
use crate::notifications::{ActionSink, Notification};
use stravels_core::models::{AccessToken, AthleteProfile, ResourceKind};

/// Phase of the login sequence
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// No session
    #[default]
    LoggedOut,
    /// Waiting for the OAuth redirect
    Authorizing,
    /// Exchanging the authorization code
    ExchangingToken,
    /// Token and user present
    LoggedIn,
}

/// Authentication state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    /// Bearer token, present only when logged in
    pub token: Option<AccessToken>,
    /// Authenticated athlete, present only when logged in
    pub user: Option<AthleteProfile>,
    /// Login phase
    pub phase: Phase,
    /// An authorize, token exchange or logout flow is in flight
    pub fetching: bool,
    /// Last session error
    pub error: Option<FlowError>,
}

impl Session {
    fn clear_credentials(&mut self) {
        self.token = None;
        self.user = None;
    }

    /// `LoggedIn` exactly when both credentials are present
    fn settle_credentials(&mut self) {
        if self.token.is_some() && self.user.is_some() {
            self.phase = Phase::LoggedIn;
        } else if self.phase == Phase::LoggedIn {
            self.phase = Phase::LoggedOut;
        }
    }

    fn fail(&mut self, error: &FlowError) {
        self.clear_credentials();
        self.phase = Phase::LoggedOut;
        self.fetching = false;
        self.error = Some(error.clone());
    }
}

/// Fetch state of one resource
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceState {
    /// Pages requested and not yet answered
    pub pending: BTreeSet<u32>,
    /// Received pages by page number
    pub pages: BTreeMap<u32, Value>,
    /// Last fetch error
    pub error: Option<FlowError>,
}

impl ResourceState {
    /// Whether any page is in flight
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        !self.pending.is_empty()
    }
}

/// Complete store state
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreState {
    /// Authentication state
    pub session: Session,
    /// Fetch state per resource
    pub resources: BTreeMap<ResourceKind, ResourceState>,
}

impl StoreState {
    /// Fetch state of `kind`, if it was ever requested
    #[must_use]
    pub fn resource(&self, kind: ResourceKind) -> Option<&ResourceState> {
        self.resources.get(&kind)
    }
}

/// Apply `notification` to `state`
pub fn reduce(state: &mut StoreState, notification: &Notification) {
    let session = &mut state.session;
    match notification {
        Notification::AuthorizeRequested => {
            session.clear_credentials();
            session.phase = Phase::Authorizing;
            session.fetching = true;
            session.error = None;
        }
        Notification::AuthorizeSucceeded { .. } => {
            session.phase = Phase::ExchangingToken;
        }
        Notification::AuthorizeFailed { error } | Notification::TokenExchangeFailed { error } => {
            session.fail(error);
        }
        Notification::TokenExchangeRequested { .. } => {
            session.phase = Phase::ExchangingToken;
            session.fetching = true;
        }
        Notification::TokenExchangeSucceeded { token, user } => {
            session.token = Some(token.clone());
            session.user = Some(user.clone());
            session.phase = Phase::LoggedIn;
            session.fetching = false;
            session.error = None;
        }
        Notification::LogoutRequested => {
            session.fetching = true;
            // In-flight login flows and fetches are cancelled with the logout
            if matches!(session.phase, Phase::Authorizing | Phase::ExchangingToken) {
                session.clear_credentials();
                session.phase = Phase::LoggedOut;
            }
            for resource in state.resources.values_mut() {
                resource.pending.clear();
            }
        }
        Notification::LogoutSucceeded => {
            session.clear_credentials();
            session.phase = Phase::LoggedOut;
            session.fetching = false;
            session.error = None;
            state.resources.clear();
        }
        Notification::LogoutFailed { error } => {
            session.fetching = false;
            session.error = Some(error.clone());
        }
        Notification::Login { token } => {
            session.token = Some(token.clone());
            session.error = None;
            session.settle_credentials();
        }
        Notification::SetUser { user } => {
            session.user = Some(user.clone());
            session.settle_credentials();
        }
        Notification::FetchRequested { kind, page } => {
            state.resources.entry(*kind).or_default().pending.insert(*page);
        }
        Notification::FetchSucceeded {
            kind,
            page,
            payload,
        } => {
            let resource = state.resources.entry(*kind).or_default();
            resource.pending.remove(page);
            resource.pages.insert(*page, payload.clone());
            resource.error = None;
        }
        Notification::FetchFailed { kind, page, error } => {
            let resource = state.resources.entry(*kind).or_default();
            resource.pending.remove(page);
            resource.error = Some(error.clone());
        }
    }
}

/// Undo the `...Requested` bookkeeping of a cancelled flow of `kind`
///
/// Cancelled flows emit nothing, so the state they were requested into stays
/// behind. An interrupted login falls back to `LoggedOut` without credentials,
/// an interrupted logout only drops the in-flight flag, and an interrupted
/// fetch forgets the pending pages of its resource. Call this once no flow of
/// `kind` is active any more.
pub fn abandon(state: &mut StoreState, kind: FlowKind) {
    let session = &mut state.session;
    match kind {
        FlowKind::Authorize | FlowKind::TokenExchange => {
            if matches!(session.phase, Phase::Authorizing | Phase::ExchangingToken) {
                session.clear_credentials();
                session.phase = Phase::LoggedOut;
                session.fetching = false;
            }
        }
        FlowKind::Logout => session.fetching = false,
        FlowKind::Fetch(resource) => {
            if let Some(resource) = state.resources.get_mut(&resource) {
                resource.pending.clear();
            }
        }
    }
}

/// Observable session store
pub struct SessionStore {
    state: watch::Sender<StoreState>,
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore {
    /// Logged-out store
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: watch::Sender::new(StoreState::default()),
        }
    }

    /// Copy of the current state
    #[must_use]
    pub fn snapshot(&self) -> StoreState {
        self.state.borrow().clone()
    }

    /// Receiver notified on every applied notification
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<StoreState> {
        self.state.subscribe()
    }

    /// Wait until `predicate` holds for the state and return that state
    pub async fn wait_until<F>(&self, mut predicate: F) -> StoreState
    where
        F: FnMut(&StoreState) -> bool,
    {
        let mut receiver = self.state.subscribe();
        let state = match receiver.wait_for(|state| predicate(state)).await {
            Ok(state) => state.clone(),
            // The sender lives as long as `self`
            Err(_) => StoreState::default(),
        };
        state
    }

    /// Reset the state left behind by cancelled flows of `kind`, see [`abandon`]
    pub fn abandon(&self, kind: FlowKind) {
        debug!(kind = %kind, "Abandoning cancelled flow state");
        self.state.send_modify(|state| abandon(state, kind));
    }

    /// Login phase
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.state.borrow().session.phase
    }

    /// Whether a session flow is in flight
    #[must_use]
    pub fn is_fetching(&self) -> bool {
        self.state.borrow().session.fetching
    }

    /// Current bearer token
    #[must_use]
    pub fn token(&self) -> Option<AccessToken> {
        self.state.borrow().session.token.clone()
    }

    /// Authenticated athlete
    #[must_use]
    pub fn user(&self) -> Option<AthleteProfile> {
        self.state.borrow().session.user.clone()
    }

    /// Last session error
    #[must_use]
    pub fn error(&self) -> Option<FlowError> {
        self.state.borrow().session.error.clone()
    }

    /// Whether the athlete is logged in with a token
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        let state = self.state.borrow();
        state.session.phase == Phase::LoggedIn && state.session.token.is_some()
    }

    /// Fetch state of `kind`
    #[must_use]
    pub fn resource(&self, kind: ResourceKind) -> ResourceState {
        self.state
            .borrow()
            .resource(kind)
            .cloned()
            .unwrap_or_default()
    }
}

impl ActionSink for SessionStore {
    fn dispatch(&self, notification: Notification) {
        debug!(action = %notification.name(), "Applying notification");
        self.state.send_modify(|state| reduce(state, &notification));
    }
}

// ABOUTME: Test doubles for the external service facade and the action sink
// ABOUTME: Scripted facade responses with a call log, stalled operations, and a recording sink
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Test doubles shared by unit and integration tests

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};
use tokio::sync::watch;

use crate::notifications::{ActionSink, Notification};
use stravels_core::constants::strava;
use stravels_core::errors::{ErrorCode, ServiceError, ServiceResult};
use stravels_core::models::{
    AccessToken, AthleteProfile, AuthorizationCode, ResourceKind, ResourcePage, TokenGrant,
};
use stravels_core::redirect::{classify_redirect, RedirectOutcome};
use stravels_providers::ExternalServiceFacade;

/// Authorization URL returned by [`MockFacade`] unless scripted otherwise
pub const TEST_AUTH_URL: &str =
    "https://www.strava.com/oauth/authorize?client_id=test&redirect_uri=stravels://localhost/auth/strava";

/// Token granted by [`MockFacade`] unless scripted otherwise
pub const TEST_TOKEN: &str = "test-access-token";

/// Facade operation, for stalling and counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FacadeOp {
    /// `generate_authorization_url`
    AuthorizationUrl,
    /// `exchange_authorization_response`
    ExchangeResponse,
    /// `exchange_code`
    ExchangeCode,
    /// `invalidate_session`
    InvalidateSession,
    /// `fetch_athlete`
    Athlete,
    /// `fetch_activities` / `fetch_connections`
    Fetch(ResourceKind),
}

/// One recorded facade call with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FacadeCall {
    /// `generate_authorization_url()`
    AuthorizationUrl,
    /// `exchange_authorization_response(url)`
    ExchangeResponse(String),
    /// `exchange_code(code)`
    ExchangeCode(AuthorizationCode),
    /// `invalidate_session()`
    InvalidateSession,
    /// `fetch_athlete()`
    Athlete,
    /// `fetch_activities(page)` / `fetch_connections(page)`
    Fetch(ResourceKind, u32),
}

impl FacadeCall {
    /// Operation this call belongs to
    #[must_use]
    pub const fn op(&self) -> FacadeOp {
        match self {
            Self::AuthorizationUrl => FacadeOp::AuthorizationUrl,
            Self::ExchangeResponse(_) => FacadeOp::ExchangeResponse,
            Self::ExchangeCode(_) => FacadeOp::ExchangeCode,
            Self::InvalidateSession => FacadeOp::InvalidateSession,
            Self::Athlete => FacadeOp::Athlete,
            Self::Fetch(kind, _) => FacadeOp::Fetch(*kind),
        }
    }
}

/// Profile granted by [`MockFacade`] unless scripted otherwise
#[must_use]
pub fn test_athlete() -> AthleteProfile {
    AthleteProfile {
        id: 1234,
        username: Some("marianne_t".to_owned()),
        firstname: Some("Marianne".to_owned()),
        lastname: Some("Teutenberg".to_owned()),
        profile: None,
    }
}

/// Scripted in-memory facade
pub struct MockFacade {
    redirect_uri: String,
    auth_url: ServiceResult<String>,
    grant: ServiceResult<TokenGrant>,
    logout: ServiceResult<()>,
    athlete: ServiceResult<AthleteProfile>,
    pages: HashMap<ResourceKind, ServiceResult<Value>>,
    stalled: HashSet<FacadeOp>,
    calls: Mutex<Vec<FacadeCall>>,
    call_count: watch::Sender<usize>,
}

impl Default for MockFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFacade {
    /// Facade where every operation succeeds
    #[must_use]
    pub fn new() -> Self {
        Self {
            redirect_uri: strava::DEFAULT_REDIRECT_URI.to_owned(),
            auth_url: Ok(TEST_AUTH_URL.to_owned()),
            grant: Ok(TokenGrant {
                token: AccessToken::new(TEST_TOKEN),
                user: test_athlete(),
            }),
            logout: Ok(()),
            athlete: Ok(test_athlete()),
            pages: HashMap::new(),
            stalled: HashSet::new(),
            calls: Mutex::new(Vec::new()),
            call_count: watch::Sender::new(0),
        }
    }

    /// Fail `generate_authorization_url` with `error`
    #[must_use]
    pub fn with_authorization_url_error(mut self, error: ServiceError) -> Self {
        self.auth_url = Err(error);
        self
    }

    /// Fail `exchange_code` with `error`
    #[must_use]
    pub fn with_exchange_error(mut self, error: ServiceError) -> Self {
        self.grant = Err(error);
        self
    }

    /// Fail `invalidate_session` with `error`
    #[must_use]
    pub fn with_logout_error(mut self, error: ServiceError) -> Self {
        self.logout = Err(error);
        self
    }

    /// Fail `fetch_athlete` with `error`
    #[must_use]
    pub fn with_athlete_error(mut self, error: ServiceError) -> Self {
        self.athlete = Err(error);
        self
    }

    /// Answer fetches of `kind` with `payload`
    #[must_use]
    pub fn with_page(mut self, kind: ResourceKind, payload: Value) -> Self {
        self.pages.insert(kind, Ok(payload));
        self
    }

    /// Fail fetches of `kind` with `error`
    #[must_use]
    pub fn with_fetch_error(mut self, kind: ResourceKind, error: ServiceError) -> Self {
        self.pages.insert(kind, Err(error));
        self
    }

    /// Never complete calls of `op`
    #[must_use]
    pub fn stalling(mut self, op: FacadeOp) -> Self {
        self.stalled.insert(op);
        self
    }

    /// Calls received so far, in order
    #[must_use]
    pub fn calls(&self) -> Vec<FacadeCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of calls of `op` received so far
    #[must_use]
    pub fn count(&self, op: FacadeOp) -> usize {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|call| call.op() == op)
            .count()
    }

    /// Wait until `count` calls of `op` were received
    pub async fn wait_for_calls(&self, op: FacadeOp, count: usize) {
        let mut receiver = self.call_count.subscribe();
        let _ = receiver.wait_for(|_| self.count(op) >= count).await;
    }

    async fn record(&self, call: FacadeCall) {
        let op = call.op();
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
        self.call_count.send_modify(|count| *count += 1);
        if self.stalled.contains(&op) {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl ExternalServiceFacade for MockFacade {
    async fn generate_authorization_url(&self) -> ServiceResult<String> {
        self.record(FacadeCall::AuthorizationUrl).await;
        self.auth_url.clone()
    }

    async fn exchange_authorization_response(
        &self,
        redirect_url: &str,
    ) -> ServiceResult<AuthorizationCode> {
        self.record(FacadeCall::ExchangeResponse(redirect_url.to_owned()))
            .await;
        match classify_redirect(redirect_url, &self.redirect_uri) {
            RedirectOutcome::Code(code) => Ok(code),
            RedirectOutcome::AccessDenied => Err(ServiceError::new(
                ErrorCode::AccessDenied,
                "athlete denied access",
            )),
            RedirectOutcome::Malformed | RedirectOutcome::Ignored => Err(ServiceError::validation(
                "redirect carries no authorization code",
            )),
        }
    }

    async fn exchange_code(&self, code: &AuthorizationCode) -> ServiceResult<TokenGrant> {
        self.record(FacadeCall::ExchangeCode(code.clone())).await;
        self.grant.clone()
    }

    async fn invalidate_session(&self) -> ServiceResult<()> {
        self.record(FacadeCall::InvalidateSession).await;
        self.logout.clone()
    }

    async fn fetch_athlete(&self) -> ServiceResult<AthleteProfile> {
        self.record(FacadeCall::Athlete).await;
        self.athlete.clone()
    }

    async fn fetch_activities(&self, page: u32) -> ServiceResult<ResourcePage> {
        self.page(ResourceKind::Activities, page).await
    }

    async fn fetch_connections(&self, page: u32) -> ServiceResult<ResourcePage> {
        self.page(ResourceKind::Connections, page).await
    }
}

impl MockFacade {
    async fn page(&self, kind: ResourceKind, page: u32) -> ServiceResult<ResourcePage> {
        self.record(FacadeCall::Fetch(kind, page)).await;
        match self.pages.get(&kind) {
            Some(Ok(payload)) => Ok(ResourcePage::new(page, payload.clone())),
            Some(Err(error)) => Err(error.clone()),
            None => Ok(ResourcePage::new(page, json!([]))),
        }
    }
}

/// Sink keeping every notification in arrival order
#[derive(Default)]
pub struct RecordingSink {
    log: watch::Sender<Vec<Notification>>,
}

impl RecordingSink {
    /// Empty sink
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications received so far
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.log.borrow().clone()
    }

    /// Names of the notifications received so far
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.log.borrow().iter().map(Notification::name).collect()
    }

    /// Terminal notifications received so far
    #[must_use]
    pub fn terminal(&self) -> Vec<Notification> {
        self.log
            .borrow()
            .iter()
            .filter(|n| n.is_terminal())
            .cloned()
            .collect()
    }

    /// Wait until a notification named `name` arrived and return it
    pub async fn wait_for(&self, name: &str) -> Option<Notification> {
        let mut receiver = self.log.subscribe();
        let log = receiver
            .wait_for(|log| log.iter().any(|n| n.name() == name))
            .await
            .ok()?;
        log.iter().find(|n| n.name() == name).cloned()
    }
}

impl ActionSink for RecordingSink {
    fn dispatch(&self, notification: Notification) {
        self.log.send_modify(|log| log.push(notification));
    }
}

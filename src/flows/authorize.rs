// ABOUTME: OAuth authorization flow driven by the deep-link redirect
// ABOUTME: Opens the channel, opens the authorization page, awaits the redirect, extracts the code
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Authorize Flow
//!
//! ```text
//! Idle -> RequestingUrl -> AwaitingRedirect -> ExchangingCode -> Succeeded | Failed
//! ```
//!
//! The deep-link channel is opened before the authorization URL is requested
//! so no redirect can be missed. Deep links that do not start with the
//! redirect URI are skipped while waiting. The channel is closed on a single
//! path before the terminal notification; if the flow is cancelled instead,
//! dropping the channel closes it.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::{Flow, FlowContext, FlowKind, FlowOutcome};
use crate::channel::{EventChannel, SharedDeepLinkSource};
use crate::errors::FlowError;
use crate::notifications::Notification;
use stravels_core::constants::{linking, strava};
use stravels_core::models::AuthorizationCode;
use stravels_core::redirect::{classify_redirect, RedirectOutcome};
use stravels_providers::SharedFacade;

/// States of the authorization state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizeState {
    /// Not started
    Idle,
    /// Channel open, authorization URL requested
    RequestingUrl,
    /// Authorization page opened, waiting for the redirect
    AwaitingRedirect,
    /// Redirect received and channel closed, extracting the code
    ExchangingCode,
    /// Code obtained
    Succeeded,
    /// Authorization failed
    Failed,
}

/// Settings of the authorization flow
#[derive(Debug, Clone)]
pub struct AuthorizeSettings {
    /// Deep-link event to listen on
    pub event_name: String,
    /// Prefix a deep link must start with to count as the redirect
    pub redirect_uri: String,
    /// Deadline for the redirect, unbounded when `None`
    pub redirect_timeout: Option<Duration>,
}

impl Default for AuthorizeSettings {
    fn default() -> Self {
        Self {
            event_name: linking::DEFAULT_EVENT.to_owned(),
            redirect_uri: strava::DEFAULT_REDIRECT_URI.to_owned(),
            redirect_timeout: None,
        }
    }
}

/// Authorization through the provider's page and the deep-link redirect
pub struct AuthorizeFlow {
    facade: SharedFacade,
    linking: SharedDeepLinkSource,
    settings: AuthorizeSettings,
    state: watch::Sender<AuthorizeState>,
}

impl AuthorizeFlow {
    /// Create an idle flow
    #[must_use]
    pub fn new(
        facade: SharedFacade,
        linking: SharedDeepLinkSource,
        settings: AuthorizeSettings,
    ) -> Self {
        Self {
            facade,
            linking,
            settings,
            state: watch::Sender::new(AuthorizeState::Idle),
        }
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> AuthorizeState {
        *self.state.borrow()
    }

    /// Observe state transitions
    #[must_use]
    pub fn subscribe_state(&self) -> watch::Receiver<AuthorizeState> {
        self.state.subscribe()
    }

    fn transition(&self, next: AuthorizeState) {
        debug!(state = ?next, "Authorize flow transition");
        self.state.send_replace(next);
    }

    /// Request the authorization page, open it, and wait for the redirect
    async fn await_redirect(&self, channel: &mut EventChannel) -> Result<String, FlowError> {
        let url = self.facade.generate_authorization_url().await?;
        self.linking.open_url(&url)?;
        self.transition(AuthorizeState::AwaitingRedirect);

        let wait = self.next_redirect(channel);
        match self.settings.redirect_timeout {
            Some(limit) => tokio::time::timeout(limit, wait)
                .await
                .map_err(|_| FlowError::RedirectTimeout {
                    after_secs: limit.as_secs(),
                })?,
            None => wait.await,
        }
    }

    /// Take events until one belongs to the redirect
    async fn next_redirect(&self, channel: &mut EventChannel) -> Result<String, FlowError> {
        loop {
            let event = channel.take().await?;
            match classify_redirect(&event.url, &self.settings.redirect_uri) {
                RedirectOutcome::Ignored => {
                    debug!(channel_id = channel.id(), "Skipping unrelated deep link");
                }
                RedirectOutcome::AccessDenied => return Err(FlowError::AccessDenied),
                RedirectOutcome::Code(_) | RedirectOutcome::Malformed => return Ok(event.url),
            }
        }
    }

    async fn exchange(&self, redirect_url: &str) -> Result<AuthorizationCode, FlowError> {
        self.facade
            .exchange_authorization_response(redirect_url)
            .await
            .map_err(FlowError::from_exchange)
    }
}

#[async_trait]
impl Flow for AuthorizeFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::Authorize
    }

    async fn run(&self, ctx: &FlowContext) -> FlowOutcome {
        self.transition(AuthorizeState::RequestingUrl);
        let mut channel = EventChannel::open(Arc::clone(&self.linking), &self.settings.event_name);

        let redirect = self.await_redirect(&mut channel).await;
        channel.close();

        let result = match redirect {
            Ok(url) => {
                self.transition(AuthorizeState::ExchangingCode);
                self.exchange(&url).await
            }
            Err(FlowError::ChannelClosed) => {
                info!(flow_id = %ctx.id(), "Deep link channel closed under the flow, stopping");
                return FlowOutcome::Cancelled;
            }
            Err(e) => Err(e),
        };

        match result {
            Ok(code) => {
                self.transition(AuthorizeState::Succeeded);
                info!(flow_id = %ctx.id(), "Authorization code received");
                ctx.finish(Notification::AuthorizeSucceeded { code })
            }
            Err(error) => {
                self.transition(AuthorizeState::Failed);
                warn!(flow_id = %ctx.id(), error = %error, "Authorization failed");
                ctx.finish(Notification::AuthorizeFailed { error })
            }
        }
    }
}

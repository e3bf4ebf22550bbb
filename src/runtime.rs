// ABOUTME: Scheduler launching flows for triggering requests with per-kind supersede policy
// ABOUTME: Tracks active flows, cancels superseded ones, chains token exchange after authorization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Runtime
//!
//! Each [`Request`] becomes one tokio task running one [`Flow`]. The runtime
//! emits the request's `...Requested` notification, then starts the flow.
//!
//! ## Policy
//!
//! - At most one [`AuthorizeFlow`] is active: a new authorize request cancels
//!   the running one.
//! - A logout request cancels the running authorize and token exchange flows
//!   and every paginated fetch.
//! - Token exchange and fetch flows are otherwise independent; several pages
//!   of one resource may be in flight.
//!
//! A replacing flow starts only after the flows it cancelled have finished
//! their cleanup, so the deep-link source never holds two channels at once.
//! Supersede decisions, chaining and completion all happen under the registry
//! lock: a flow that was cancelled never chains.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::channel::SharedDeepLinkSource;
use crate::flows::{
    AuthorizeFlow, AuthorizeSettings, Flow, FlowContext, FlowGate, FlowId, FlowKind, FlowOutcome,
    LogoutFlow, PaginatedFetchFlow, TokenExchangeFlow,
};
use crate::errors::FlowError;
use crate::notifications::{Notification, Request, SharedSink};
use stravels_core::models::{AccessToken, AthleteProfile};
use stravels_providers::SharedFacade;

/// Scheduling options
#[derive(Debug, Clone)]
pub struct RuntimeOptions {
    /// Settings passed to every authorize flow
    pub authorize: AuthorizeSettings,
    /// Start a token exchange when an authorize flow succeeds
    pub chain_token_exchange: bool,
}

impl Default for RuntimeOptions {
    fn default() -> Self {
        Self {
            authorize: AuthorizeSettings::default(),
            chain_token_exchange: true,
        }
    }
}

/// Whether starting a `new` flow cancels a `running` one
#[must_use]
pub const fn supersedes(new: FlowKind, running: FlowKind) -> bool {
    match new {
        FlowKind::Authorize => matches!(running, FlowKind::Authorize),
        FlowKind::Logout => matches!(
            running,
            FlowKind::Authorize | FlowKind::TokenExchange | FlowKind::Fetch(_)
        ),
        FlowKind::TokenExchange | FlowKind::Fetch(_) => false,
    }
}

/// Handle on one started flow
#[derive(Debug)]
pub struct FlowTicket {
    id: FlowId,
    kind: FlowKind,
    outcome: oneshot::Receiver<FlowOutcome>,
}

impl FlowTicket {
    /// Id of the flow
    #[must_use]
    pub const fn id(&self) -> FlowId {
        self.id
    }

    /// Kind of the flow
    #[must_use]
    pub const fn kind(&self) -> FlowKind {
        self.kind
    }

    /// Wait for the flow to end
    ///
    /// A flow whose task was torn down without reporting counts as cancelled.
    pub async fn wait(self) -> FlowOutcome {
        self.outcome.await.unwrap_or(FlowOutcome::Cancelled)
    }
}

struct FlowEntry {
    kind: FlowKind,
    gate: Arc<FlowGate>,
    join: JoinHandle<()>,
}

type Registry = HashMap<FlowId, FlowEntry>;

struct RuntimeInner {
    facade: SharedFacade,
    linking: SharedDeepLinkSource,
    sink: SharedSink,
    options: RuntimeOptions,
    registry: Mutex<Registry>,
}

impl RuntimeInner {
    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn build(&self, request: &Request) -> Box<dyn Flow> {
        let facade = Arc::clone(&self.facade);
        match request {
            Request::Authorize => Box::new(AuthorizeFlow::new(
                facade,
                Arc::clone(&self.linking),
                self.options.authorize.clone(),
            )),
            Request::TokenExchange { code } => {
                Box::new(TokenExchangeFlow::new(facade, code.clone()))
            }
            Request::Logout => Box::new(LogoutFlow::new(facade)),
            Request::Fetch { kind, page } => Box::new(PaginatedFetchFlow::new(facade, *kind, *page)),
        }
    }

    /// Announce `request` and start its flow; the caller holds the registry lock
    fn start(self: &Arc<Self>, registry: &mut Registry, request: &Request) -> FlowTicket {
        let flow = self.build(request);
        let kind = flow.kind();

        let superseded: Vec<FlowEntry> = {
            let ids: Vec<FlowId> = registry
                .iter()
                .filter(|(_, entry)| supersedes(kind, entry.kind))
                .map(|(id, _)| *id)
                .collect();
            ids.iter().filter_map(|id| registry.remove(id)).collect()
        };
        for entry in &superseded {
            if entry.gate.cancel() {
                info!(kind = %entry.kind, by = %kind, "Cancelling superseded flow");
            }
        }

        self.sink.dispatch(request.notification());

        let id = FlowId::next();
        let gate = Arc::new(FlowGate::new());
        let ctx = FlowContext::with_gate(id, Arc::clone(&self.sink), Arc::clone(&gate));
        let (sender, outcome) = oneshot::channel();
        let inner = Arc::clone(self);
        let span = info_span!("flow", flow_id = %id, kind = %kind);

        let join = tokio::spawn(
            async move {
                let outcome = ctx
                    .run_cancellable(async {
                        for prior in superseded {
                            let _ = prior.join.await;
                        }
                        flow.run(&ctx).await
                    })
                    .await;
                debug!(cancelled = outcome.is_cancelled(), "Flow ended");
                inner.complete(id, &outcome);
                let _ = sender.send(outcome);
            }
            .instrument(span),
        );

        registry.insert(id, FlowEntry { kind, gate, join });
        FlowTicket { id, kind, outcome }
    }

    /// Retire a finished flow and start its follow-up, if any
    fn complete(self: &Arc<Self>, id: FlowId, outcome: &FlowOutcome) {
        let mut registry = self.lock();
        if registry.remove(&id).is_none() {
            return;
        }
        if !self.options.chain_token_exchange {
            return;
        }
        if let FlowOutcome::Completed(Notification::AuthorizeSucceeded { code }) = outcome {
            debug!(flow_id = %id, "Chaining token exchange");
            let request = Request::TokenExchange { code: code.clone() };
            let _chained = self.start(&mut registry, &request);
        }
    }
}

/// Flow scheduler
#[derive(Clone)]
pub struct Runtime {
    inner: Arc<RuntimeInner>,
}

impl Runtime {
    /// Runtime emitting into `sink`
    #[must_use]
    pub fn new(
        facade: SharedFacade,
        linking: SharedDeepLinkSource,
        sink: SharedSink,
        options: RuntimeOptions,
    ) -> Self {
        Self {
            inner: Arc::new(RuntimeInner {
                facade,
                linking,
                sink,
                options,
                registry: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Start the flow for `request`, cancelling the flows it supersedes
    ///
    /// Must be called from within a tokio runtime.
    pub fn dispatch(&self, request: Request) -> FlowTicket {
        let mut registry = self.inner.lock();
        self.inner.start(&mut registry, &request)
    }

    /// Cancel one flow and wait for its cleanup
    ///
    /// Returns `false` if the flow was not active or had already emitted its
    /// terminal notification. A cancelled flow emits nothing, so the sink keeps
    /// the state its request notification produced; stores reset it with
    /// [`crate::session::SessionStore::abandon`].
    pub async fn cancel(&self, id: FlowId) -> bool {
        let entry = self.inner.lock().remove(&id);
        let Some(entry) = entry else {
            return false;
        };
        let cancelled = entry.gate.cancel();
        let _ = entry.join.await;
        if cancelled {
            info!(flow_id = %id, kind = %entry.kind, "Flow cancelled");
        }
        cancelled
    }

    /// Cancel every active flow and wait for their cleanup
    ///
    /// Returns the kinds of the flows that were cancelled, one entry per kind,
    /// for [`crate::session::SessionStore::abandon`].
    pub async fn shutdown(&self) -> Vec<FlowKind> {
        let entries: Vec<(FlowId, FlowEntry)> = self.inner.lock().drain().collect();
        info!(active = entries.len(), "Shutting down flow runtime");
        let mut cancelled = Vec::new();
        for (_, entry) in &entries {
            if entry.gate.cancel() && !cancelled.contains(&entry.kind) {
                cancelled.push(entry.kind);
            }
        }
        for (_, entry) in entries {
            let _ = entry.join.await;
        }
        cancelled
    }

    /// Adopt a previously issued token and load its athlete
    ///
    /// The facade must already authenticate with `token`. `Login` and `SetUser`
    /// are emitted only once the athlete loaded, so a failed restore leaves
    /// the sink untouched.
    ///
    /// # Errors
    ///
    /// Returns the facade error if the athlete profile cannot be loaded
    pub async fn restore_session(&self, token: AccessToken) -> Result<AthleteProfile, FlowError> {
        let user = self.inner.facade.fetch_athlete().await.map_err(|e| {
            warn!(error = %e, "Session restore failed");
            FlowError::Service(e)
        })?;
        self.inner.sink.dispatch(Notification::Login { token });
        self.inner.sink.dispatch(Notification::SetUser { user: user.clone() });
        info!(athlete_id = user.id, "Session restored");
        Ok(user)
    }

    /// Ids of the active flows of `kind`, oldest first
    #[must_use]
    pub fn active(&self, kind: FlowKind) -> Vec<FlowId> {
        let mut ids: Vec<FlowId> = self
            .inner
            .lock()
            .iter()
            .filter(|(_, entry)| entry.kind == kind)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Number of active flows
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stravels_core::models::ResourceKind;

    #[test]
    fn test_supersede_policy() {
        let fetch = FlowKind::Fetch(ResourceKind::Activities);
        assert!(supersedes(FlowKind::Authorize, FlowKind::Authorize));
        assert!(!supersedes(FlowKind::Authorize, FlowKind::TokenExchange));
        assert!(supersedes(FlowKind::Logout, FlowKind::Authorize));
        assert!(supersedes(FlowKind::Logout, FlowKind::TokenExchange));
        assert!(supersedes(FlowKind::Logout, fetch));
        assert!(!supersedes(FlowKind::Logout, FlowKind::Logout));
        assert!(!supersedes(fetch, fetch));
        assert!(!supersedes(FlowKind::TokenExchange, FlowKind::TokenExchange));
    }
}

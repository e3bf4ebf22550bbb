// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Builds the mock facade, in-process deep-link hub, and recording sink used by flow tests
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]
//! Shared test utilities for `stravels`

use std::sync::{Arc, Once};
use std::time::Duration;
use stravels::channel::SharedDeepLinkSource;
use stravels::flows::{AuthorizeFlow, AuthorizeSettings, AuthorizeState, FlowContext};
use stravels::linking::LinkingHub;
use stravels::notifications::{FanOutSink, SharedSink};
use stravels::runtime::{Runtime, RuntimeOptions};
use stravels::session::SessionStore;
use stravels::test_utils::{MockFacade, RecordingSink};
use stravels_core::constants::{linking, strava};
use stravels_providers::SharedFacade;

/// Redirect URI the flows expect
pub const REDIRECT: &str = strava::DEFAULT_REDIRECT_URI;
/// Deep-link event the flows listen on
pub const EVENT: &str = linking::DEFAULT_EVENT;
/// Redirect carrying the code `XYZ`
pub const CODE_REDIRECT: &str = "stravels://localhost/auth/strava&code=XYZ";
/// Redirect signalling that the athlete declined
pub const DENIED_REDIRECT: &str = "stravels://localhost/auth/strava?error=access_denied";

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Collaborators of one test
pub struct Fixture {
    pub facade: Arc<MockFacade>,
    pub hub: Arc<LinkingHub>,
    pub sink: Arc<RecordingSink>,
    pub store: Arc<SessionStore>,
}

impl Fixture {
    pub fn new(facade: MockFacade) -> Self {
        init_test_logging();
        Self {
            facade: Arc::new(facade),
            hub: Arc::new(LinkingHub::new()),
            sink: Arc::new(RecordingSink::new()),
            store: Arc::new(SessionStore::new()),
        }
    }

    pub fn shared_facade(&self) -> SharedFacade {
        Arc::clone(&self.facade) as SharedFacade
    }

    pub fn shared_hub(&self) -> SharedDeepLinkSource {
        Arc::clone(&self.hub) as SharedDeepLinkSource
    }

    /// Sink feeding both the recorder and the session store
    pub fn shared_sink(&self) -> SharedSink {
        Arc::new(FanOutSink::new(vec![
            Arc::clone(&self.sink) as SharedSink,
            Arc::clone(&self.store) as SharedSink,
        ]))
    }

    /// Context for running a flow outside the runtime
    pub fn ctx(&self) -> FlowContext {
        FlowContext::new(self.shared_sink())
    }

    pub fn authorize_flow(&self, settings: AuthorizeSettings) -> AuthorizeFlow {
        AuthorizeFlow::new(self.shared_facade(), self.shared_hub(), settings)
    }

    pub fn runtime(&self, options: RuntimeOptions) -> Runtime {
        Runtime::new(
            self.shared_facade(),
            self.shared_hub(),
            self.shared_sink(),
            options,
        )
    }

    /// Runtime that does not chain a token exchange after authorization
    pub fn unchained_runtime(&self) -> Runtime {
        self.runtime(RuntimeOptions {
            chain_token_exchange: false,
            ..RuntimeOptions::default()
        })
    }
}

/// Wait until `flow` reaches `state`
pub async fn await_state(flow: &AuthorizeFlow, state: AuthorizeState) {
    let mut receiver = flow.subscribe_state();
    tokio::time::timeout(Duration::from_secs(5), receiver.wait_for(|s| *s == state))
        .await
        .expect("flow did not reach the expected state")
        .expect("state channel closed");
}

/// Let spawned tasks make progress
pub async fn settle() {
    tokio::time::sleep(Duration::from_millis(20)).await;
}

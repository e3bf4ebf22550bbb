// ABOUTME: Command modules for stravels-cli
// ABOUTME: Session commands (login, logout) and page fetch commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod fetch;
pub mod session;

use anyhow::{bail, Result};
use std::sync::Arc;
use stravels::config::AppConfig;
use stravels::linking::LinkingHub;
use stravels::channel::SharedDeepLinkSource;
use stravels::notifications::{FanOutSink, SharedSink, TracingSink};
use stravels::runtime::Runtime;
use stravels::session::SessionStore;
use stravels_core::models::AccessToken;
use stravels_providers::{SharedFacade, StravaClient};
use tracing::debug;

/// Runtime wired to the Strava client, a session store, and an in-process hub
pub struct Harness {
    /// Flow scheduler
    pub runtime: Runtime,
    /// Session state fed by the runtime
    pub store: Arc<SessionStore>,
    /// Deep-link source the login command feeds
    pub hub: Arc<LinkingHub>,
    /// Strava client behind the facade
    pub client: Arc<StravaClient>,
}

impl Harness {
    /// Build the harness; `token` seeds the client for commands that skip login
    pub fn new(config: &AppConfig, hub: LinkingHub, token: Option<AccessToken>) -> Self {
        let mut client = StravaClient::new(config.strava.to_client_config());
        if let Some(token) = token {
            client = client.with_access_token(token);
        }
        let client = Arc::new(client);
        let store = Arc::new(SessionStore::new());
        let hub = Arc::new(hub);
        let store_sink: SharedSink = Arc::clone(&store) as SharedSink;
        let sink: SharedSink = Arc::new(FanOutSink::new(vec![store_sink, Arc::new(TracingSink)]));
        let facade: SharedFacade = Arc::clone(&client) as SharedFacade;
        let linking: SharedDeepLinkSource = Arc::clone(&hub) as SharedDeepLinkSource;
        let runtime = Runtime::new(facade, linking, sink, config.runtime_options());
        Self {
            runtime,
            store,
            hub,
            client,
        }
    }

    /// Build the harness for a pre-issued token and restore its session
    pub async fn restored(config: &AppConfig, token: AccessToken) -> Result<Self> {
        let harness = Self::new(config, LinkingHub::new(), Some(token.clone()));
        let user = harness.runtime.restore_session(token).await?;
        debug!(athlete_id = user.id, "Using pre-issued token");
        Ok(harness)
    }
}

/// Pre-issued token from `STRAVA_ACCESS_TOKEN`
pub fn required_token(config: &AppConfig) -> Result<AccessToken> {
    match &config.strava.access_token {
        Some(token) => Ok(AccessToken::new(token.as_str())),
        None => bail!("STRAVA_ACCESS_TOKEN is not set; run `stravels-cli login` first"),
    }
}

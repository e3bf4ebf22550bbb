// ABOUTME: Login and logout commands for stravels-cli
// ABOUTME: Feeds pasted redirect URLs into the deep-link hub and reports the session outcome
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::{anyhow, bail, Result};
use std::sync::Arc;
use stravels::config::AppConfig;
use stravels::flows::FlowOutcome;
use stravels::linking::LinkingHub;
use stravels::notifications::{Notification, Request};
use stravels::session::Phase;
use std::io::BufRead;
use tracing::{debug, info};

use super::{required_token, Harness};
use crate::helpers::display;

/// Authorize, then exchange the code for a token
pub async fn login(config: &AppConfig) -> Result<()> {
    config.strava.validate()?;

    let hub = LinkingHub::with_opener(|url| {
        display::authorization_prompt(url);
        Ok(())
    });
    let harness = Harness::new(config, hub, None);
    let event = config.runtime.deep_link_event.clone();

    // Pasted lines stand in for the platform's deep-link delivery; the
    // blocking reader thread is left behind when the process exits
    let reader_hub = Arc::clone(&harness.hub);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines().map_while(Result::ok) {
            let url = line.trim();
            if !url.is_empty() {
                let delivered = reader_hub.emit(&event, url);
                debug!(delivered, "Redirect URL pasted");
            }
        }
    });

    let outcome = harness.runtime.dispatch(Request::Authorize).wait().await;
    let result = finish_login(&harness, config, outcome).await;

    for kind in harness.runtime.shutdown().await {
        harness.store.abandon(kind);
    }
    result
}

async fn finish_login(harness: &Harness, config: &AppConfig, outcome: FlowOutcome) -> Result<()> {
    let code = match outcome {
        FlowOutcome::Completed(Notification::AuthorizeSucceeded { code }) => code,
        FlowOutcome::Completed(other) => {
            let error = other
                .error()
                .map_or_else(|| other.name(), ToString::to_string);
            bail!("authorization failed: {error}");
        }
        FlowOutcome::Cancelled => bail!("authorization cancelled"),
    };
    info!("Authorization code received, exchanging");

    if !config.runtime.chain_token_exchange {
        harness
            .runtime
            .dispatch(Request::TokenExchange { code })
            .wait()
            .await;
    }

    let state = harness
        .store
        .wait_until(|state| {
            state.session.phase == Phase::LoggedIn
                || (state.session.phase == Phase::LoggedOut && state.session.error.is_some())
        })
        .await;

    match (state.session.token, state.session.user) {
        (Some(token), Some(user)) => {
            display::logged_in(&user, &token);
            Ok(())
        }
        _ => Err(anyhow!(
            "token exchange failed: {}",
            state
                .session
                .error
                .map_or_else(|| "unknown error".to_owned(), |e| e.to_string())
        )),
    }
}

/// Invalidate the session of the pre-issued token
pub async fn logout(config: &AppConfig) -> Result<()> {
    let harness = Harness::restored(config, required_token(config)?).await?;

    let outcome = harness.runtime.dispatch(Request::Logout).wait().await;
    match outcome.notification() {
        Some(Notification::LogoutSucceeded) => {
            println!("Logged out");
            Ok(())
        }
        Some(notification) => bail!(
            "logout failed: {}",
            notification
                .error()
                .map_or_else(|| notification.name(), ToString::to_string)
        ),
        None => bail!("logout cancelled"),
    }
}

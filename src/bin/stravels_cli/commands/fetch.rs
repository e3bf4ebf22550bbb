// ABOUTME: Page fetch commands for stravels-cli
// ABOUTME: Runs one paginated fetch flow and prints the payload as JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::{bail, Result};
use stravels::config::AppConfig;
use stravels::notifications::{Notification, Request};
use stravels_core::models::ResourceKind;

use super::{required_token, Harness};
use crate::helpers::display;

/// Fetch one page of activities
pub async fn activities(config: &AppConfig, page: Option<u32>) -> Result<()> {
    run(config, ResourceKind::Activities, page).await
}

/// Fetch one page of connections
pub async fn connections(config: &AppConfig, page: Option<u32>) -> Result<()> {
    run(config, ResourceKind::Connections, page).await
}

async fn run(config: &AppConfig, kind: ResourceKind, page: Option<u32>) -> Result<()> {
    let harness = Harness::restored(config, required_token(config)?).await?;

    let outcome = harness
        .runtime
        .dispatch(Request::Fetch { kind, page })
        .wait()
        .await;

    match outcome.notification() {
        Some(Notification::FetchSucceeded { page, payload, .. }) => {
            display::page(kind, *page, payload)?;
            display::rate_limit(&harness.client.usage());
            Ok(())
        }
        Some(notification) => bail!(
            "{} failed: {}",
            notification.name(),
            notification
                .error()
                .map_or_else(|| "unknown error".to_owned(), ToString::to_string)
        ),
        None => bail!("fetch cancelled"),
    }
}

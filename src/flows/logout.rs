// ABOUTME: Logout flow invalidating the remote session
// ABOUTME: Failure leaves the local session phase untouched so the athlete can retry
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Flow, FlowContext, FlowKind, FlowOutcome};
use crate::errors::FlowError;
use crate::notifications::Notification;
use stravels_providers::SharedFacade;

/// Invalidation of the remote session
pub struct LogoutFlow {
    facade: SharedFacade,
}

impl LogoutFlow {
    /// Create the flow
    #[must_use]
    pub fn new(facade: SharedFacade) -> Self {
        Self { facade }
    }
}

#[async_trait]
impl Flow for LogoutFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::Logout
    }

    async fn run(&self, ctx: &FlowContext) -> FlowOutcome {
        match self.facade.invalidate_session().await {
            Ok(()) => {
                info!(flow_id = %ctx.id(), "Logged out");
                ctx.finish(Notification::LogoutSucceeded)
            }
            Err(e) => {
                warn!(flow_id = %ctx.id(), error = %e, "Logout failed");
                ctx.finish(Notification::LogoutFailed {
                    error: FlowError::Service(e),
                })
            }
        }
    }
}

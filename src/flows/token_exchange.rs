// ABOUTME: Token exchange flow turning an authorization code into a token and athlete profile
// ABOUTME: Stateless request/response step with no resources to release
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Flow, FlowContext, FlowKind, FlowOutcome};
use crate::errors::FlowError;
use crate::notifications::Notification;
use stravels_core::models::AuthorizationCode;
use stravels_providers::SharedFacade;

/// Exchange of the code carried by the triggering request
pub struct TokenExchangeFlow {
    facade: SharedFacade,
    code: AuthorizationCode,
}

impl TokenExchangeFlow {
    /// Create the flow for `code`
    #[must_use]
    pub fn new(facade: SharedFacade, code: AuthorizationCode) -> Self {
        Self { facade, code }
    }
}

#[async_trait]
impl Flow for TokenExchangeFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::TokenExchange
    }

    async fn run(&self, ctx: &FlowContext) -> FlowOutcome {
        match self.facade.exchange_code(&self.code).await {
            Ok(grant) => {
                info!(flow_id = %ctx.id(), athlete_id = grant.user.id, "Token exchange succeeded");
                ctx.finish(Notification::TokenExchangeSucceeded {
                    token: grant.token,
                    user: grant.user,
                })
            }
            Err(e) => {
                warn!(flow_id = %ctx.id(), error = %e, "Token exchange failed");
                ctx.finish(Notification::TokenExchangeFailed {
                    error: FlowError::Service(e),
                })
            }
        }
    }
}

// ABOUTME: Paginated fetch flow shared by the activities and connections resources
// ABOUTME: Defaults to page zero and emits the page payload or the failure
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use tracing::{debug, warn};

use super::{Flow, FlowContext, FlowKind, FlowOutcome};
use crate::errors::FlowError;
use crate::notifications::{Notification, DEFAULT_PAGE};
use stravels_core::models::ResourceKind;
use stravels_providers::SharedFacade;

/// Fetch of one page of a resource
///
/// Several pages of the same resource may be in flight at once; ordering and
/// merging of pages is up to the consumer of the notifications.
pub struct PaginatedFetchFlow {
    facade: SharedFacade,
    kind: ResourceKind,
    page: u32,
}

impl PaginatedFetchFlow {
    /// Create the flow; a missing page means [`DEFAULT_PAGE`]
    #[must_use]
    pub fn new(facade: SharedFacade, kind: ResourceKind, page: Option<u32>) -> Self {
        Self {
            facade,
            kind,
            page: page.unwrap_or(DEFAULT_PAGE),
        }
    }

    /// Page this flow fetches
    #[must_use]
    pub const fn page(&self) -> u32 {
        self.page
    }
}

#[async_trait]
impl Flow for PaginatedFetchFlow {
    fn kind(&self) -> FlowKind {
        FlowKind::Fetch(self.kind)
    }

    async fn run(&self, ctx: &FlowContext) -> FlowOutcome {
        let (kind, page) = (self.kind, self.page);
        match self.facade.fetch(kind, page).await {
            Ok(response) => {
                debug!(flow_id = %ctx.id(), kind = %kind, page, "Page fetched");
                ctx.finish(Notification::FetchSucceeded {
                    kind,
                    page,
                    payload: response.data,
                })
            }
            Err(e) => {
                warn!(flow_id = %ctx.id(), kind = %kind, page, error = %e, "Page fetch failed");
                ctx.finish(Notification::FetchFailed {
                    kind,
                    page,
                    error: FlowError::Service(e),
                })
            }
        }
    }
}

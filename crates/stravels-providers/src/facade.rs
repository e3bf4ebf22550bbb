// ABOUTME: Abstract external service facade consumed by the orchestration flows
// ABOUTME: Authorization URL, redirect exchange, token exchange, logout, and paginated fetches
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::ServiceResult;
use crate::models::{AthleteProfile, AuthorizationCode, ResourceKind, ResourcePage, TokenGrant};

/// Shared handle to a facade implementation
pub type SharedFacade = Arc<dyn ExternalServiceFacade>;

/// Operations the orchestrator needs from the remote fitness API
///
/// Implementations must be safe to call concurrently; flows share one instance
/// and never mutate it beyond invoking these operations.
#[async_trait]
pub trait ExternalServiceFacade: Send + Sync {
    /// Produce the URL of the provider's authorization page
    async fn generate_authorization_url(&self) -> ServiceResult<String>;

    /// Turn the redirect URL delivered by the deep link into an authorization code
    async fn exchange_authorization_response(
        &self,
        redirect_url: &str,
    ) -> ServiceResult<AuthorizationCode>;

    /// Exchange an authorization code for a bearer token and the athlete profile
    async fn exchange_code(&self, code: &AuthorizationCode) -> ServiceResult<TokenGrant>;

    /// Invalidate the remote session
    async fn invalidate_session(&self) -> ServiceResult<()>;

    /// Load the profile of the athlete the current token belongs to
    async fn fetch_athlete(&self) -> ServiceResult<AthleteProfile>;

    /// Fetch one zero-based page of the athlete's activities
    async fn fetch_activities(&self, page: u32) -> ServiceResult<ResourcePage>;

    /// Fetch one zero-based page of the athlete's connections
    async fn fetch_connections(&self, page: u32) -> ServiceResult<ResourcePage>;

    /// Fetch one page of `kind`
    async fn fetch(&self, kind: ResourceKind, page: u32) -> ServiceResult<ResourcePage> {
        match kind {
            ResourceKind::Activities => self.fetch_activities(page).await,
            ResourceKind::Connections => self.fetch_connections(page).await,
        }
    }
}

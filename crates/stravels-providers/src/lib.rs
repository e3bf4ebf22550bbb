// ABOUTME: External service facade contract and the Strava implementation behind it
// ABOUTME: Shared HTTP client, rate limit usage tracking, and the OAuth/REST client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! External service implementations for the Stravels orchestrator.
//!
//! Flows only ever see the [`ExternalServiceFacade`] trait. [`StravaClient`] is the
//! production implementation; tests substitute their own.

// Re-export stravels-core modules so provider files can keep `use crate::errors::*`
pub use stravels_core::constants;
pub use stravels_core::errors;
pub use stravels_core::models;

/// Abstract capability set the orchestrator calls into
pub mod facade;
/// Shared HTTP client for provider API calls
pub mod http_client;
/// Rate limit usage derived from Strava response headers
pub mod rate_limit;
/// Strava OAuth and REST client
pub mod strava;

pub use facade::{ExternalServiceFacade, SharedFacade};
pub use http_client::{initialize_shared_client, shared_client};
pub use rate_limit::RateLimitUsage;
pub use strava::{StravaClient, StravaClientConfig};

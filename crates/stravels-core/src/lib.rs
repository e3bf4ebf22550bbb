// ABOUTME: Core types and constants for the Stravels OAuth and sync orchestrator
// ABOUTME: Foundation crate with error codes, domain models, redirect parsing, and constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Stravels Core
//!
//! Foundation crate providing shared types and constants for the Stravels
//! orchestrator. It has no async runtime dependency so both the provider crate
//! and the flow runtime can build on it.
//!
//! ## Modules
//!
//! - **errors**: `ErrorCode` and `ServiceError`, the failure type of every facade call
//! - **models**: authorization codes, tokens, athlete profiles, resource pages
//! - **redirect**: classification of deep-link URLs against the OAuth redirect URI
//! - **constants**: Strava endpoints, default redirect URI, environment variable names

/// Standard error codes and the facade service error
pub mod errors;

/// Domain models exchanged between flows and the external service
pub mod models;

/// OAuth redirect URL classification
pub mod redirect;

/// Application constants organized by domain
pub mod constants;

pub use errors::{ErrorCode, ServiceError, ServiceResult};
pub use models::{
    AccessToken, AthleteProfile, AuthorizationCode, ResourceKind, ResourcePage, TokenGrant,
};
pub use redirect::{classify_redirect, RedirectOutcome};

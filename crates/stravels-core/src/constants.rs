// ABOUTME: Application constants for Strava endpoints, OAuth defaults, and environment keys
// ABOUTME: Single source for literals shared by the provider crate, runtime, and CLI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Strava endpoints and OAuth defaults
pub mod strava {
    /// Default Strava origin
    pub const BASE_URL: &str = "https://www.strava.com";
    /// Path of the authorization page
    pub const AUTHORIZE_PATH: &str = "/oauth/authorize";
    /// Path of the token exchange endpoint
    pub const TOKEN_PATH: &str = "/oauth/token";
    /// Path of the session invalidation endpoint
    pub const DEAUTHORIZE_PATH: &str = "/oauth/deauthorize";
    /// Prefix of the REST API
    pub const API_PREFIX: &str = "/api/v3";
    /// Profile of the authenticated athlete, under the API prefix
    pub const ATHLETE_PATH: &str = "/athlete";
    /// Redirect URI registered for the mobile client
    pub const DEFAULT_REDIRECT_URI: &str = "stravels://localhost/auth/strava";
    /// Scope requested by default
    pub const DEFAULT_SCOPES: &str = "view_private";
    /// Default page size
    pub const DEFAULT_PER_PAGE: u32 = 30;
    /// Maximum page size Strava accepts
    pub const MAX_PER_PAGE: u32 = 200;
    /// Rate limit header carrying "short,long" window limits
    pub const RATE_LIMIT_HEADER: &str = "X-RateLimit-Limit";
    /// Rate limit header carrying "short,long" window usage
    pub const RATE_USAGE_HEADER: &str = "X-RateLimit-Usage";
}

/// Deep-link source defaults
pub mod linking {
    /// Event name the platform uses for incoming URLs
    pub const DEFAULT_EVENT: &str = "url";
}

/// Service names used in structured logs
pub mod service_names {
    /// Name of this service
    pub const STRAVELS: &str = "stravels";
}

/// Environment variable names
pub mod env_keys {
    /// OAuth client id
    pub const STRAVA_CLIENT_ID: &str = "STRAVA_CLIENT_ID";
    /// OAuth client secret
    pub const STRAVA_CLIENT_SECRET: &str = "STRAVA_CLIENT_SECRET";
    /// OAuth redirect URI
    pub const STRAVA_REDIRECT_URI: &str = "STRAVA_REDIRECT_URI";
    /// Comma separated OAuth scopes
    pub const STRAVA_SCOPES: &str = "STRAVA_SCOPES";
    /// Strava origin override
    pub const STRAVA_BASE_URL: &str = "STRAVA_BASE_URL";
    /// Pre-issued access token
    pub const STRAVA_ACCESS_TOKEN: &str = "STRAVA_ACCESS_TOKEN";
    /// Page size for paginated fetches
    pub const STRAVA_PER_PAGE: &str = "STRAVA_PER_PAGE";
    /// HTTP request timeout in seconds
    pub const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
    /// HTTP connect timeout in seconds
    pub const HTTP_CONNECT_TIMEOUT_SECS: &str = "HTTP_CONNECT_TIMEOUT_SECS";
    /// Deadline for the OAuth redirect, unbounded when unset
    pub const REDIRECT_TIMEOUT_SECS: &str = "STRAVELS_REDIRECT_TIMEOUT_SECS";
    /// Start a token exchange after a successful authorization
    pub const CHAIN_TOKEN_EXCHANGE: &str = "STRAVELS_CHAIN_TOKEN_EXCHANGE";
    /// Deep-link event name
    pub const DEEP_LINK_EVENT: &str = "STRAVELS_DEEP_LINK_EVENT";
}

// ABOUTME: Domain models exchanged between orchestration flows and the Strava facade
// ABOUTME: Authorization codes, access tokens, athlete profiles, and paginated resource payloads
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque authorization code carried by the OAuth redirect
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationCode(String);

impl AuthorizationCode {
    /// Wrap a raw code
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    /// Borrow the raw code
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthorizationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthorizationCode {
    fn from(code: &str) -> Self {
        Self::new(code)
    }
}

/// Bearer token issued by the token exchange
///
/// `Debug` is redacted so tokens never reach the logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Wrap a raw token
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Borrow the raw token
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

impl From<&str> for AccessToken {
    fn from(token: &str) -> Self {
        Self::new(token)
    }
}

/// Athlete profile returned alongside the access token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteProfile {
    /// Strava athlete id
    pub id: u64,
    /// Public username
    #[serde(default)]
    pub username: Option<String>,
    /// First name
    #[serde(default)]
    pub firstname: Option<String>,
    /// Last name
    #[serde(default)]
    pub lastname: Option<String>,
    /// Avatar URL
    #[serde(default)]
    pub profile: Option<String>,
}

impl AthleteProfile {
    /// Name suitable for display, falling back to the username and then the id
    #[must_use]
    pub fn display_name(&self) -> String {
        match (&self.firstname, &self.lastname) {
            (Some(first), Some(last)) => format!("{first} {last}"),
            (Some(first), None) => first.clone(),
            _ => self
                .username
                .clone()
                .unwrap_or_else(|| format!("athlete {}", self.id)),
        }
    }
}

/// Successful token exchange: the bearer token plus the athlete it belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    /// Access token
    pub token: AccessToken,
    /// Profile of the authorizing athlete
    pub user: AthleteProfile,
}

/// Paginated resources the orchestrator can fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// The athlete's own activities
    Activities,
    /// The athlete's connections (friends)
    Connections,
}

impl ResourceKind {
    /// Stable lowercase name used in logs
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Activities => "activities",
            Self::Connections => "connections",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One page of a paginated resource as returned by the facade
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourcePage {
    /// Zero-based page number that was requested
    #[serde(default)]
    pub page: u32,
    /// Raw payload of the page
    pub data: serde_json::Value,
}

impl ResourcePage {
    /// Build a page
    #[must_use]
    pub const fn new(page: u32, data: serde_json::Value) -> Self {
        Self { page, data }
    }

    /// Number of items when the payload is an array
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.as_array().map_or(0, Vec::len)
    }

    /// Whether the payload holds no items
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_access_token_debug_is_redacted() {
        let token = AccessToken::new("secret-token");
        assert_eq!(format!("{token:?}"), "AccessToken(***)");
        assert_eq!(token.as_str(), "secret-token");
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut athlete = AthleteProfile {
            id: 7,
            ..AthleteProfile::default()
        };
        assert_eq!(athlete.display_name(), "athlete 7");
        athlete.username = Some("runner".to_owned());
        assert_eq!(athlete.display_name(), "runner");
        athlete.firstname = Some("Ada".to_owned());
        athlete.lastname = Some("L".to_owned());
        assert_eq!(athlete.display_name(), "Ada L");
    }

    #[test]
    fn test_athlete_accepts_strava_field_names() {
        let athlete: AthleteProfile = serde_json::from_str(
            r#"{"id": 12, "firstname": "Ada", "profile": "https://x/a.png", "profile_medium": "https://x/m.png", "city": "Paris"}"#,
        )
        .unwrap();
        assert_eq!(athlete.id, 12);
        assert_eq!(athlete.profile.as_deref(), Some("https://x/a.png"));
    }

    #[test]
    fn test_resource_page_len() {
        let page = ResourcePage::new(0, serde_json::json!([1, 2, 3]));
        assert_eq!(page.len(), 3);
        assert!(ResourcePage::new(1, serde_json::json!("foo")).is_empty());
    }
}

// ABOUTME: Classification of deep-link URLs against the expected OAuth redirect URI
// ABOUTME: Separates unrelated links, access denials, authorization codes, and malformed redirects
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use regex::Regex;
use std::sync::OnceLock;

use crate::models::AuthorizationCode;

/// Marker Strava appends to the redirect when the athlete declines
pub const ACCESS_DENIED_MARKER: &str = "error=access_denied";

/// Result of matching one deep-link URL against the redirect URI
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedirectOutcome {
    /// The link does not belong to the OAuth redirect; keep waiting
    Ignored,
    /// The athlete declined the authorization
    AccessDenied,
    /// The redirect carries an authorization code
    Code(AuthorizationCode),
    /// The redirect matched but carried neither a code nor a denial
    Malformed,
}

impl RedirectOutcome {
    /// Whether this outcome ends the wait for a redirect
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, Self::Ignored)
    }
}

fn code_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"[&?]code=(\w+)").ok())
        .as_ref()
}

/// Classify `url` against `redirect_uri`
///
/// Only URLs starting with the redirect URI are considered; anything else is
/// another deep link that happened to arrive while the flow was waiting.
#[must_use]
pub fn classify_redirect(url: &str, redirect_uri: &str) -> RedirectOutcome {
    if !url.starts_with(redirect_uri) {
        return RedirectOutcome::Ignored;
    }
    if url.contains(ACCESS_DENIED_MARKER) {
        return RedirectOutcome::AccessDenied;
    }
    code_pattern()
        .and_then(|pattern| pattern.captures(url))
        .and_then(|captures| captures.get(1))
        .map_or(RedirectOutcome::Malformed, |code| {
            RedirectOutcome::Code(AuthorizationCode::new(code.as_str()))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIRECT: &str = "stravels://localhost/auth/strava";

    #[test]
    fn test_code_after_ampersand() {
        assert_eq!(
            classify_redirect("stravels://localhost/auth/strava&code=XYZ", REDIRECT),
            RedirectOutcome::Code(AuthorizationCode::new("XYZ"))
        );
    }

    #[test]
    fn test_code_in_query_string() {
        assert_eq!(
            classify_redirect(
                "stravels://localhost/auth/strava?state=&code=ab12&scope=read",
                REDIRECT
            ),
            RedirectOutcome::Code(AuthorizationCode::new("ab12"))
        );
    }

    #[test]
    fn test_access_denied() {
        assert_eq!(
            classify_redirect(
                "stravels://localhost/auth/strava?state=&error=access_denied",
                REDIRECT
            ),
            RedirectOutcome::AccessDenied
        );
    }

    #[test]
    fn test_unrelated_links_are_ignored() {
        for url in [
            "stravels://localhost/settings",
            "https://www.strava.com/auth/strava&code=XYZ",
            "",
        ] {
            let outcome = classify_redirect(url, REDIRECT);
            assert_eq!(outcome, RedirectOutcome::Ignored, "{url}");
            assert!(!outcome.is_terminal());
        }
    }

    #[test]
    fn test_matching_prefix_without_code_is_malformed() {
        assert_eq!(
            classify_redirect("stravels://localhost/auth/strava?state=x", REDIRECT),
            RedirectOutcome::Malformed
        );
    }
}

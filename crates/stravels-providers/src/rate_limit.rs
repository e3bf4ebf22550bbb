// ABOUTME: Rate limit usage tracking from Strava X-RateLimit response headers
// ABOUTME: Computes the used fraction of the short (15 minute) and long (daily) windows
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::Serialize;

/// Fraction of each Strava rate limit window already consumed
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RateLimitUsage {
    /// Fraction of the 15 minute window, `None` until the first response
    pub short: Option<f64>,
    /// Fraction of the daily window, `None` until the first response
    pub long: Option<f64>,
}

impl RateLimitUsage {
    /// Parse the "short,long" limit and usage header values
    ///
    /// Returns `None` when either header is garbled or a limit is zero.
    #[must_use]
    pub fn from_headers(limit: &str, usage: &str) -> Option<Self> {
        let limits = parse_pair(limit)?;
        let usages = parse_pair(usage)?;
        if limits.0 == 0 || limits.1 == 0 {
            return None;
        }
        Some(Self {
            short: Some(f64::from(usages.0) / f64::from(limits.0)),
            long: Some(f64::from(usages.1) / f64::from(limits.1)),
        })
    }

    /// Whether either window is fully used
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.short.is_some_and(|s| s >= 1.0) || self.long.is_some_and(|l| l >= 1.0)
    }
}

fn parse_pair(value: &str) -> Option<(u32, u32)> {
    let mut parts = value.split(',').map(|part| part.trim().parse::<u32>());
    let first = parts.next()?.ok()?;
    let second = parts.next()?.ok()?;
    Some((first, second))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn test_usage_fractions() {
        let usage = RateLimitUsage::from_headers("600,30000", "300,3000").unwrap();
        assert_eq!(usage.short, Some(0.5));
        assert_eq!(usage.long, Some(0.1));
        assert!(!usage.is_exhausted());
    }

    #[test]
    fn test_exhausted_window() {
        let usage = RateLimitUsage::from_headers("100,1000", "100,20").unwrap();
        assert!(usage.is_exhausted());
    }

    #[test]
    fn test_garbled_headers() {
        assert!(RateLimitUsage::from_headers("600", "1,2").is_none());
        assert!(RateLimitUsage::from_headers("a,b", "1,2").is_none());
        assert!(RateLimitUsage::from_headers("0,100", "1,2").is_none());
        assert!(RateLimitUsage::default().short.is_none());
    }
}

// ABOUTME: Output formatting helpers for stravels-cli
// ABOUTME: Authorization prompt, login summary, page payloads, and rate limit usage
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::Result;
use serde_json::Value;
use stravels_core::models::{AccessToken, AthleteProfile, ResourceKind};
use stravels_providers::RateLimitUsage;

/// Ask the athlete to authorize and paste the redirect
pub fn authorization_prompt(url: &str) {
    println!("\nOpen this URL in a browser and approve access:");
    println!("{}", "=".repeat(80));
    println!("{url}");
    println!("{}", "=".repeat(80));
    println!("Then paste the URL Strava redirected to and press Enter:");
}

/// Summary after a successful login
pub fn logged_in(user: &AthleteProfile, token: &AccessToken) {
    println!("\nLogged in as {} (athlete {})", user.display_name(), user.id);
    println!("Export the token to use the fetch commands:");
    println!("  export STRAVA_ACCESS_TOKEN=\"{}\"", token.as_str());
}

/// Print a page payload as pretty JSON
pub fn page(kind: ResourceKind, page: u32, payload: &Value) -> Result<()> {
    let count = payload.as_array().map_or(0, Vec::len);
    eprintln!("{kind} page {page}: {count} item(s)");
    println!("{}", serde_json::to_string_pretty(payload)?);
    Ok(())
}

/// Print rate limit usage when Strava reported it
pub fn rate_limit(usage: &RateLimitUsage) {
    if let (Some(short), Some(long)) = (usage.short, usage.long) {
        eprintln!(
            "Rate limit usage: {:.0}% of 15 min window, {:.0}% of daily window",
            short * 100.0,
            long * 100.0
        );
        if usage.is_exhausted() {
            eprintln!("Rate limit exhausted; further requests will be rejected");
        }
    }
}

// ABOUTME: Configuration module loading Strava credentials and runtime policy from the environment
// ABOUTME: Defines the configuration error type shared by every loader
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! - **Environment**: Strava client settings, runtime options, and the
//!   bundle the CLI loads at startup

use thiserror::Error;

/// Environment-driven configuration
pub mod environment;

pub use environment::{AppConfig, RuntimeConfig, StravaConfig};

/// Configuration error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A required variable is unset or empty
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    /// A variable holds a value of the wrong shape
    #[error("Parse error for {key}: {value:?}")]
    Parse {
        /// Variable name
        key: &'static str,
        /// Offending value
        value: String,
    },

    /// A value parsed but is outside its allowed range
    #[error("Value out of range: {0}")]
    ValueOutOfRange(&'static str),
}

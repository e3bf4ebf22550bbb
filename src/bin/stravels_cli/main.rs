// ABOUTME: Stravels CLI - drives the authorization and fetch flows from a terminal
// ABOUTME: Login through a pasted redirect URL, page fetches, and logout against the Strava API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Authorize and exchange the code; paste the redirect URL when prompted
//! stravels-cli login
//!
//! # Fetch the first page of activities with a pre-issued token
//! STRAVA_ACCESS_TOKEN=... stravels-cli activities
//!
//! # Fetch page 3 of connections
//! STRAVA_ACCESS_TOKEN=... stravels-cli connections --page 3
//!
//! # Invalidate the session
//! STRAVA_ACCESS_TOKEN=... stravels-cli logout
//! ```

mod commands;
mod helpers;

use anyhow::Result;
use clap::{Parser, Subcommand};
use stravels::config::AppConfig;
use stravels_providers::initialize_shared_client;
use tracing::{debug, info};

#[derive(Parser)]
#[command(
    name = "stravels-cli",
    about = "Stravels authorization and sync CLI",
    long_about = "Command-line driver for the Stravels OAuth handshake and Strava page fetches."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Authorize with Strava and exchange the code for a token
    Login,

    /// Fetch one page of the athlete's activities
    Activities {
        /// Zero-based page
        #[arg(long)]
        page: Option<u32>,
    },

    /// Fetch one page of the athlete's connections
    Connections {
        /// Zero-based page
        #[arg(long)]
        page: Option<u32>,
    },

    /// Invalidate the session
    Logout,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = AppConfig::from_env()?;
    let logging = if cli.verbose {
        config.logging.clone().verbose()
    } else {
        config.logging.clone()
    };
    logging.init()?;

    info!("Stravels CLI");

    if !initialize_shared_client(
        config.strava.http_timeout_secs,
        config.strava.http_connect_timeout_secs,
    ) {
        debug!("Shared HTTP client already initialized");
    }

    match cli.command {
        Command::Login => commands::session::login(&config).await?,
        Command::Activities { page } => commands::fetch::activities(&config, page).await?,
        Command::Connections { page } => commands::fetch::connections(&config, page).await?,
        Command::Logout => commands::session::logout(&config).await?,
    }

    Ok(())
}

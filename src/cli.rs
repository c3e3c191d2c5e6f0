//! Command-line interface parsing for the tripcache tool
//!
//! This module handles parsing of CLI arguments using clap, including the
//! subcommands that drive the offline layer and the helpers that turn raw
//! JSON arguments into typed payloads and control messages.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;
use thiserror::Error;

use crate::control::ControlMessage;

/// Error types for CLI argument parsing
#[derive(Debug, Error)]
pub enum CliError {
    /// The argument is not valid JSON
    #[error("Invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),

    /// The JSON parses but is not a recognized control message
    #[error("Invalid control message: '{0}'. Valid types: skip-waiting, cache-one-record, clear-all, report-cache-size")]
    InvalidMessage(String),
}

/// tripcache - Offline cache and sync layer for the TripMate travel planner
#[derive(Parser, Debug)]
#[command(name = "tripcache")]
#[command(about = "Precache, serve, and sync TripMate data across network outages")]
#[command(version)]
pub struct Cli {
    /// Path to config file (default: ./tripcache.yaml, then the XDG config dir)
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Treat the network as unavailable and serve from caches only
    #[arg(long)]
    pub offline: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Operations exposed by the tool
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show lifecycle phase, connectivity, cache sizes, and queued writes
    Status,

    /// Precache the configured manifest and sweep stale cache versions
    Warm,

    /// Fetch one URL through the offline strategies and print the result
    ///
    /// Examples:
    ///   tripcache fetch https://tripmate.example/app.js
    ///   tripcache --offline fetch https://api.tripmate.example/api/cities/search?query=rome
    Fetch {
        /// Request URL
        url: String,

        /// Accept header to classify with (text/html marks a navigation)
        #[arg(long, value_name = "MIME", default_value = "*/*")]
        accept: String,
    },

    /// Save a write, queueing it when the backend is unreachable
    Save {
        /// API path of the write (e.g. /api/itineraries)
        endpoint: String,

        /// JSON body to send
        json: String,
    },

    /// Replay queued writes against the backend
    Sync,

    /// Apply a control message given as JSON
    ///
    /// Examples:
    ///   tripcache message '{"type":"skip-waiting"}'
    ///   tripcache message '{"type":"report-cache-size"}'
    Message {
        /// The message JSON
        json: String,
    },
}

/// Parses a raw JSON string argument into a payload value.
///
/// # Arguments
/// * `s` - The JSON string from the CLI
///
/// # Returns
/// * `Ok(Value)` if the string is valid JSON
/// * `Err(CliError::InvalidJson)` otherwise
pub fn parse_payload_arg(s: &str) -> Result<Value, CliError> {
    Ok(serde_json::from_str(s)?)
}

/// Parses a raw JSON string argument into a control message.
///
/// # Arguments
/// * `s` - The JSON string from the CLI
///
/// # Returns
/// * `Ok(ControlMessage)` if the JSON carries a recognized `type`
/// * `Err(CliError::InvalidJson)` if the string is not JSON at all
/// * `Err(CliError::InvalidMessage)` if the JSON is not a known message
pub fn parse_message_arg(s: &str) -> Result<ControlMessage, CliError> {
    let value: Value = serde_json::from_str(s)?;
    serde_json::from_value(value).map_err(|_| CliError::InvalidMessage(s.to_string()))
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! by the wallet host. Configuration is loaded from the environment at
//! startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATA_DIR` | Directory holding the wallet database | `./data` |
//! | `SESSION_TTL_SECS` | Passphrase lifetime after sign-in | `3600` |
//! | `RPC_FRESHNESS_WINDOW` | Max blocks an endpoint may lag the tip | `30` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable name for the data directory.
///
/// The redb file `wallet.redb` is created inside it.
pub const DATA_DIR_ENV: &str = "DATA_DIR";

/// Environment variable name for the session lifetime in seconds.
pub const SESSION_TTL_ENV: &str = "SESSION_TTL_SECS";

/// Environment variable name for the endpoint freshness window in blocks.
pub const FRESHNESS_WINDOW_ENV: &str = "RPC_FRESHNESS_WINDOW";

/// Environment variable name for the log output format.
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_SESSION_TTL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_FRESHNESS_WINDOW: u64 = 30;

/// File name of the wallet database inside `DATA_DIR`.
pub const DATABASE_FILE: &str = "wallet.redb";

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

impl LogFormat {
    fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

/// Engine configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub data_dir: PathBuf,
    pub session_ttl: Duration,
    pub freshness_window: u64,
    pub log_format: LogFormat,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            session_ttl: DEFAULT_SESSION_TTL,
            freshness_window: DEFAULT_FRESHNESS_WINDOW,
            log_format: LogFormat::default(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable lookup.
    ///
    /// Unparseable numeric values fall back to their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let data_dir = lookup(DATA_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let session_ttl = match lookup(SESSION_TTL_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => Duration::from_secs(secs),
                _ => {
                    tracing::warn!(value = %raw, "Invalid {SESSION_TTL_ENV}, using default");
                    defaults.session_ttl
                }
            },
            None => defaults.session_ttl,
        };

        let freshness_window = match lookup(FRESHNESS_WINDOW_ENV) {
            Some(raw) => match raw.trim().parse::<u64>() {
                Ok(window) if window > 0 => window,
                _ => {
                    tracing::warn!(value = %raw, "Invalid {FRESHNESS_WINDOW_ENV}, using default");
                    defaults.freshness_window
                }
            },
            None => defaults.freshness_window,
        };

        let log_format = lookup(LOG_FORMAT_ENV)
            .map(|raw| LogFormat::parse(&raw))
            .unwrap_or_default();

        Self {
            data_dir,
            session_ttl,
            freshness_window,
            log_format,
        }
    }

    /// Path of the redb database file.
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(DATABASE_FILE)
    }
}

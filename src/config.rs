//! Search and server settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default cap on overlap checks per pack.
pub const DEFAULT_MAX_CHECKS: u64 = 500_000_000;

/// Default cap on pieces expanded from demand lines per pack.
pub const DEFAULT_MAX_PIECES: u64 = 1_000_000;

/// Default cap on sheets held by one pool, inventory or opened on demand.
pub const DEFAULT_MAX_SHEETS: u64 = 100_000;

/// Order in which candidate origins are visited on a sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanOrder {
    /// `x` in the outer loop, `y` in the inner loop: fills columns top to bottom.
    #[default]
    XMajor,
    /// `y` in the outer loop, `x` in the inner loop: lowest row first, then leftmost.
    YMajor,
}

impl std::str::FromStr for ScanOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "x-major" => Ok(ScanOrder::XMajor),
            "y-major" => Ok(ScanOrder::YMajor),
            _ => Err(format!(
                "invalid scan order '{}', expected: x-major or y-major",
                s
            )),
        }
    }
}

/// Tuning for a single pack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    pub scan_order: ScanOrder,
    /// Overlap checks allowed before the search gives up. `None` is unlimited.
    pub max_checks: Option<u64>,
    /// Wall-clock budget for the search. `None` is unlimited.
    pub time_limit: Option<Duration>,
    /// Total demand units accepted, checked before expansion. `None` is unlimited.
    pub max_pieces: Option<u64>,
    /// Sheets a pool may hold, checked before any sheet is allocated. `None` is unlimited.
    pub max_sheets: Option<u64>,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            scan_order: ScanOrder::default(),
            max_checks: Some(DEFAULT_MAX_CHECKS),
            time_limit: None,
            max_pieces: Some(DEFAULT_MAX_PIECES),
            max_sheets: Some(DEFAULT_MAX_SHEETS),
        }
    }
}

impl PackConfig {
    pub fn with_scan_order(mut self, order: ScanOrder) -> Self {
        self.scan_order = order;
        self
    }

    pub fn with_max_checks(mut self, max_checks: Option<u64>) -> Self {
        self.max_checks = max_checks;
        self
    }

    pub fn with_time_limit(mut self, limit: Option<Duration>) -> Self {
        self.time_limit = limit;
        self
    }

    pub fn with_max_pieces(mut self, max_pieces: Option<u64>) -> Self {
        self.max_pieces = max_pieces;
        self
    }

    pub fn with_max_sheets(mut self, max_sheets: Option<u64>) -> Self {
        self.max_sheets = max_sheets;
        self
    }

    /// Config with no check, time, piece or sheet limit.
    #[cfg(test)]
    pub fn unlimited() -> Self {
        Self::default()
            .with_max_checks(None)
            .with_max_pieces(None)
            .with_max_sheets(None)
    }
}

/// Settings for the HTTP server, read from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub log_file: String,
    pub sentry_dsn: Option<String>,
    pub pack: PackConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            log_file: "development.log".to_string(),
            sentry_dsn: None,
            pack: PackConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.port = port
                .parse()
                .map_err(|_| format!("invalid PORT '{}'", port))?;
        }
        if let Some(path) = lookup("LOG_FILE") {
            config.log_file = path;
        }
        config.sentry_dsn = lookup("SENTRY_DSN").filter(|dsn| !dsn.is_empty());

        if let Some(max) = lookup("PACK_MAX_CHECKS") {
            config.pack.max_checks = parse_limit("PACK_MAX_CHECKS", &max)?;
        }
        if let Some(max) = lookup("PACK_MAX_PIECES") {
            config.pack.max_pieces = parse_limit("PACK_MAX_PIECES", &max)?;
        }
        if let Some(max) = lookup("PACK_MAX_SHEETS") {
            config.pack.max_sheets = parse_limit("PACK_MAX_SHEETS", &max)?;
        }
        if let Some(ms) = lookup("PACK_TIME_LIMIT_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| format!("invalid PACK_TIME_LIMIT_MS '{}'", ms))?;
            config.pack.time_limit = Some(Duration::from_millis(ms));
        }

        Ok(config)
    }
}

/// Parses a limit where 0 means unlimited.
fn parse_limit(key: &str, value: &str) -> Result<Option<u64>, String> {
    let max: u64 = value
        .parse()
        .map_err(|_| format!("invalid {} '{}'", key, value))?;
    Ok((max > 0).then_some(max))
}

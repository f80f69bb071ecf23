//! Server configuration
//!
//! # Environment variables
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | DB_PATH | ./tombola-db.json | Persistent document store file |
//! | FILES_PATH | ./files | Root for per-card artifact directories |
//! | ORDER_PENDING_TTL_MINUTES | 30 | Pending order lifetime |
//! | PAYMENT_MODE | SIMULATED | SIMULATED auto-approves manual orders |
//! | ISSUANCE_RETRY_MULTIPLIER | 20 | Card-generation attempt budget per requested card |

use std::path::PathBuf;

/// How manual (admin-created) orders settle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMode {
    /// Approve and issue immediately, without waiting for a signal
    Simulated,
    /// Wait for an explicit confirmation signal
    Live,
}

impl PaymentMode {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_uppercase().as_str() {
            "LIVE" => PaymentMode::Live,
            _ => PaymentMode::Simulated,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the JSON document store
    pub db_path: PathBuf,
    /// Root directory for card artifact preparation
    pub files_root: PathBuf,
    /// Minutes a PENDING_PAYMENT order stays payable
    pub pending_ttl_minutes: i64,
    /// Settlement mode for manual orders
    pub payment_mode: PaymentMode,
    /// Safety ceiling: generation attempts allowed per requested card
    pub issuance_retry_multiplier: u32,
}

impl Config {
    /// Load configuration from environment variables, with defaults
    pub fn from_env() -> Self {
        Self {
            db_path: std::env::var("DB_PATH")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("tombola-db.json")),
            files_root: std::env::var("FILES_PATH")
                .ok()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("files")),
            pending_ttl_minutes: std::env::var("ORDER_PENDING_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(30),
            payment_mode: std::env::var("PAYMENT_MODE")
                .map(|v| PaymentMode::parse(&v))
                .unwrap_or(PaymentMode::Simulated),
            issuance_retry_multiplier: std::env::var("ISSUANCE_RETRY_MULTIPLIER")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(20),
        }
    }

    /// Override the filesystem paths, keeping everything else
    ///
    /// Used by tests running against a temp directory.
    pub fn with_overrides(db_path: impl Into<PathBuf>, files_root: impl Into<PathBuf>) -> Self {
        let mut config = Self::from_env();
        config.db_path = db_path.into();
        config.files_root = files_root.into();
        config
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

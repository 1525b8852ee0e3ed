//! Error type definitions for iptv-scout
//!
//! Two families live here. [`AppError`] is what a pipeline run reports to its
//! caller (storage unavailable, output file unwritable, bad configuration).
//! [`UnitError`] describes why a single probe or speed test produced nothing;
//! the governor counts and logs these but never lets them escape a batch.

use thiserror::Error;

/// Top-level error for a pipeline run
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors (SeaORM)
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Storage could not be opened or migrated
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Filesystem errors while writing the playlist or temp files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// HTTP client construction or batch-level HTTP failures
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Why a single work unit yielded no result
#[derive(Error, Debug)]
pub enum UnitError {
    /// Connection refused/reset, DNS failure, truncated body
    #[error("Network error for {url}: {message}")]
    Network { url: String, message: String },

    /// Request-level timeout reported by the HTTP client
    #[error("Request timed out: {url}")]
    Timeout { url: String },

    /// Unexpected HTTP status
    #[error("Unexpected HTTP status {status} from {url}")]
    Status { url: String, status: u16 },

    /// Malformed manifest, empty playlist, missing segment line
    #[error("Parse error for {url}: {message}")]
    Parse { url: String, message: String },

    /// Writing a downloaded segment to scratch space failed
    #[error("I/O error for {url}: {message}")]
    Io { url: String, message: String },

    /// The admission gate was closed before the unit could run
    #[error("Admission gate closed")]
    GateClosed,
}

impl AppError {
    /// Create a storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

impl UnitError {
    /// Classify a reqwest failure for the given URL
    pub fn from_reqwest<S: Into<String>>(url: S, error: reqwest::Error) -> Self {
        let url = url.into();
        if error.is_timeout() {
            Self::Timeout { url }
        } else if let Some(status) = error.status() {
            Self::Status {
                url,
                status: status.as_u16(),
            }
        } else if error.is_decode() {
            Self::Parse {
                url,
                message: error.to_string(),
            }
        } else {
            Self::Network {
                url,
                message: error.to_string(),
            }
        }
    }

    pub fn parse<S: Into<String>, M: Into<String>>(url: S, message: M) -> Self {
        Self::Parse {
            url: url.into(),
            message: message.into(),
        }
    }

    pub fn io<S: Into<String>>(url: S, error: std::io::Error) -> Self {
        Self::Io {
            url: url.into(),
            message: error.to_string(),
        }
    }

    /// Short label used in batch statistics and debug logs
    pub fn kind(&self) -> &'static str {
        match self {
            UnitError::Network { .. } => "network",
            UnitError::Timeout { .. } => "timeout",
            UnitError::Status { .. } => "status",
            UnitError::Parse { .. } => "parse",
            UnitError::Io { .. } => "io",
            UnitError::GateClosed => "gate_closed",
        }
    }
}

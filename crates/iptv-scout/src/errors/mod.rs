//! Centralized error handling for iptv-scout
//!
//! # Error Categories
//!
//! - **Run-level errors** ([`AppError`]): storage, output I/O and configuration
//!   failures. These abort the current pipeline run and are reported to the
//!   caller; the menu or scheduler keeps going.
//! - **Unit-level errors** ([`UnitError`]): network, timeout, status and parse
//!   failures of a single probe or speed test. These are swallowed by the
//!   governor and only show up as an absent result.

pub mod types;

pub use types::*;

/// Convenience type alias for Results using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convenience type alias for a single unit of batch work
pub type UnitResult<T> = Result<T, UnitError>;

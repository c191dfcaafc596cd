//! Observability utilities.
//!
//! The crate logs through `tracing`; this module installs a subscriber for
//! binaries that do not bring their own.
//!
//! # Example
//!
//! ```no_run
//! use hubstore::config::LoggingConfig;
//! use hubstore::observability::init_tracing;
//!
//! init_tracing(&LoggingConfig::default()).unwrap();
//! tracing::info!("storage ready");
//! ```

pub mod logger;

// Re-export main functions for convenience
pub use logger::{build_filter, init_tracing};

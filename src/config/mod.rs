//! Configuration management for storage selection.
//!
//! This module provides configuration loading through TOML files and
//! environment variable overrides via `.env` files.
//!
//! # Example
//!
//! ```no_run
//! use hubstore::config::{ConfigurationLoader, EnvironmentLoader};
//! use std::path::Path;
//!
//! let env = EnvironmentLoader::new(None);
//! let mut loader = ConfigurationLoader::new(Some(Path::new("config/hubstore.toml"))).unwrap();
//! env.apply(&mut loader.config);
//!
//! println!("Ready event: {}", loader.config.selection.ready_event);
//! println!("Constrained host: {:?}", env.constrained_host());
//! ```

pub mod config;
pub mod environment;

// Re-export main types for convenience
pub use self::config::{Configuration, ConfigurationLoader, LoggingConfig};
pub use self::environment::EnvironmentLoader;

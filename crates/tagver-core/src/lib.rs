//! Core library for tagver.
//!
//! This crate provides the foundational types and functionality used by the
//! `tagver` CLI and any downstream consumers.
//!
//! # Modules
//!
//! - [`bump`] - Version bump execution (file updates, updated-file registry)
//! - [`changelog`] - Changelog generation and splicing
//! - [`config`] - Configuration loading and management
//! - [`error`] - Error types and result aliases
//! - [`fsio`] - Dry-run aware file writes
//! - [`git`] - Git operations for release workflows
//! - [`hooks`] - Lifecycle scripts
//! - [`release`] - The release workflow orchestrator
//! - [`updaters`] - Version readers and writers for tracked files
//! - [`version`] - Version determination and computation
//!
//! # Quick Start
//!
//! ```no_run
//! use tagver_core::{Config, ConfigLoader};
//!
//! let config = ConfigLoader::new()
//!     .with_user_config(true)
//!     .load()
//!     .expect("Failed to load configuration");
//!
//! println!("Log level: {:?}", config.log_level);
//! ```
#![deny(unsafe_code)]

pub mod bump;

pub mod changelog;

pub mod config;

pub mod error;

pub mod fsio;

pub mod git;

pub mod hooks;

pub mod release;

pub mod updaters;

pub mod version;

pub use config::{Config, ConfigLoader, LogLevel};

pub use error::{ConfigError, ConfigResult};

pub use release::{EventSink, Figure, ReleaseError, ReleaseEvent, ReleaseOutcome};

// Re-export semver so downstream crates don't need a direct dependency.
pub use semver;

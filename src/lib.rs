//! Sitewright - idempotent PHP-on-IIS site provisioning.
//!
//! Sitewright converges a Windows host to a working PHP website served by
//! IIS over FastCGI. Every run observes the host, mutates only what
//! diverges from the desired state, and reports what it did, so the tool
//! is safe to run repeatedly.
//!
//! # Modules
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`config`] - The desired end state for one run
//! - [`error`] - Error types and result aliases
//! - [`host`] - Collaborator traits and production host adapters
//! - [`lock`] - Site-scoped advisory run lock
//! - [`php`] - PHP version handling and release URL derivation
//! - [`pipeline`] - Step ordering and run outcomes
//! - [`steps`] - The individual convergence steps
//!
//! # Example
//!
//! ```
//! use sitewright::php::PhpVersion;
//!
//! let version: PhpVersion = "8.4.1".parse().unwrap();
//! assert!(version.download_url().contains("vs17"));
//! ```

pub mod cli;
pub mod config;
pub mod error;
pub mod host;
pub mod lock;
pub mod php;
pub mod pipeline;
pub mod steps;

pub use error::{ProvisionError, Result};

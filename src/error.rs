//! Error types for sitewright operations.
//!
//! This module defines [`ProvisionError`], the primary error type used
//! throughout the application, and a [`Result`] type alias for convenience.
//!
//! # Error Handling Strategy
//!
//! - Every failure is fatal: a step either fully succeeds or the whole run
//!   aborts. There is no retry logic at this level and no partial-success
//!   reporting.
//! - A required reboot is *not* an error. It is a soft stop surfaced as a
//!   pipeline outcome with its own exit code.
//! - Use `anyhow::Error` (via `ProvisionError::Other`) for unexpected errors.

use std::path::PathBuf;
use thiserror::Error;

/// Core error type for sitewright operations.
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The running identity does not hold administrator authority.
    #[error("administrator privileges are required; re-run from an elevated shell")]
    PrivilegeDenied,

    /// Enabling an OS optional feature failed.
    #[error("failed to enable feature '{feature}': {message}")]
    FeatureEnableFailed { feature: String, message: String },

    /// A silent installer exited with a code outside the allow-list.
    #[error("installer for '{package}' exited with unexpected code {code}")]
    PackageInstallFailed { package: String, code: i32 },

    /// A download URL did not answer the metadata probe.
    #[error("download URL is unreachable ({status}): {url}")]
    DownloadUnreachable { url: String, status: u16 },

    /// A download failed after the transport's retry budget was exhausted.
    #[error("download failed for {url}: {message}")]
    DownloadFailed { url: String, message: String },

    /// An archive could not be unpacked.
    #[error("failed to extract {archive}: {message}")]
    ExtractionFailed { archive: PathBuf, message: String },

    /// An archive unpacked cleanly but did not contain the expected binary.
    #[error("archive did not contain the expected binary at {expected}")]
    ArchiveLayoutMismatch { expected: PathBuf },

    /// A write to the web-server configuration store (or ACL store) failed.
    #[error("configuration write failed for {target}: {message}")]
    ConfigWriteFailed { target: String, message: String },

    /// Another run is already converging the same site name.
    #[error("another sitewright run is already in progress for site '{site}'")]
    AlreadyRunning { site: String },

    /// The desired configuration is invalid before any host state is read.
    #[error("invalid configuration: {message}")]
    InvalidSpec { message: String },

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic wrapped error for anyhow interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for sitewright operations.
pub type Result<T> = std::result::Result<T, ProvisionError>;

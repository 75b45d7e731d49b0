//! CLI argument definitions.
//!
//! This module defines all CLI arguments using clap's derive macros. The
//! whole invocation surface is one command: every parameter of the desired
//! end state has a default, so a bare `sitewright` run converges the host
//! to the stock PHP site.

use clap::Parser;
use std::path::PathBuf;

/// Sitewright - idempotent PHP-on-IIS site provisioning.
#[derive(Debug, Parser)]
#[command(name = "sitewright")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Site name (also used as the application pool name)
    #[arg(long, env = "SITEWRIGHT_SITE", default_value = "php.local")]
    pub site: String,

    /// Host header for the HTTP binding (defaults to the site name)
    #[arg(long, env = "SITEWRIGHT_HOST_HEADER")]
    pub host_header: Option<String>,

    /// Physical path of the site content directory
    #[arg(long, env = "SITEWRIGHT_PATH", default_value = "C:\\inetpub\\phpsite")]
    pub path: PathBuf,

    /// PHP version to provision (dotted triplet)
    #[arg(long, env = "SITEWRIGHT_PHP_VERSION", default_value = "8.3.0")]
    pub php_version: String,

    /// Directory the PHP interpreter is unpacked into
    #[arg(long, env = "SITEWRIGHT_INSTALL_PATH", default_value = "C:\\php")]
    pub install_path: PathBuf,

    /// HTTP port for the site binding
    #[arg(long, env = "SITEWRIGHT_PORT", default_value_t = 80)]
    pub port: u16,

    /// Emit the convergence report as JSON instead of styled lines
    #[arg(long)]
    pub json: bool,

    /// Minimal output
    #[arg(short, long)]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

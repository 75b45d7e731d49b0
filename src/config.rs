//! The desired end state for one provisioning run.
//!
//! A [`SiteSpec`] is constructed once from the CLI arguments, validated,
//! and read-only from then on. Every convergence step receives it by
//! reference; nothing in the pipeline mutates it.

use crate::cli::Cli;
use crate::error::{ProvisionError, Result};
use crate::php::PhpVersion;
use std::path::PathBuf;

/// Ordered default documents configured at the site scope.
pub const DEFAULT_DOCUMENTS: &[&str] = &["index.php", "index.html", "index.htm"];

/// Identity granted read-and-execute on the content directory.
pub const ANONYMOUS_IDENTITY: &str = "IUSR";

/// Immutable input parameters for one convergence run.
#[derive(Debug, Clone)]
pub struct SiteSpec {
    /// Site name; doubles as the application pool name.
    pub site_name: String,

    /// Host header on the HTTP binding.
    pub host_header: String,

    /// Physical content directory.
    pub content_path: PathBuf,

    /// Interpreter version to provision.
    pub php_version: PhpVersion,

    /// Directory the interpreter archive is unpacked into.
    pub install_path: PathBuf,

    /// HTTP port (1-65535).
    pub port: u16,
}

impl SiteSpec {
    /// Build and validate a spec from parsed CLI arguments.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        let site_name = cli.site.trim().to_string();
        if site_name.is_empty() {
            return Err(ProvisionError::InvalidSpec {
                message: "site name must not be empty".to_string(),
            });
        }

        if cli.port == 0 {
            return Err(ProvisionError::InvalidSpec {
                message: "port must be between 1 and 65535".to_string(),
            });
        }

        let php_version: PhpVersion = cli.php_version.parse()?;

        let host_header = cli
            .host_header
            .clone()
            .unwrap_or_else(|| site_name.clone());

        Ok(SiteSpec {
            site_name,
            host_header,
            content_path: cli.path.clone(),
            php_version,
            install_path: cli.install_path.clone(),
            port: cli.port,
        })
    }

    /// Resolved path of the CGI binary once the interpreter is provisioned.
    pub fn cgi_binary(&self) -> PathBuf {
        self.install_path.join(crate::php::CGI_BINARY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["sitewright"];
        full.extend_from_slice(args);
        Cli::parse_from(full)
    }

    #[test]
    fn host_header_defaults_to_site_name() {
        let spec = SiteSpec::from_cli(&cli(&["--site", "test.local"])).unwrap();
        assert_eq!(spec.host_header, "test.local");
    }

    #[test]
    fn explicit_host_header_wins() {
        let spec =
            SiteSpec::from_cli(&cli(&["--site", "test.local", "--host-header", "www.test.local"]))
                .unwrap();
        assert_eq!(spec.host_header, "www.test.local");
    }

    #[test]
    fn empty_site_name_rejected() {
        let err = SiteSpec::from_cli(&cli(&["--site", "  "])).unwrap_err();
        assert!(err.to_string().contains("site name"));
    }

    #[test]
    fn zero_port_rejected() {
        let err = SiteSpec::from_cli(&cli(&["--port", "0"])).unwrap_err();
        assert!(err.to_string().contains("port"));
    }

    #[test]
    fn malformed_version_rejected() {
        let err = SiteSpec::from_cli(&cli(&["--php-version", "8.3"])).unwrap_err();
        assert!(err.to_string().contains("dotted-triplet"));
    }

    #[test]
    fn cgi_binary_joins_install_path() {
        let spec = SiteSpec::from_cli(&cli(&["--install-path", "/opt/php83"])).unwrap();
        assert_eq!(spec.cgi_binary(), PathBuf::from("/opt/php83/php-cgi.exe"));
    }

    #[test]
    fn default_documents_are_ordered() {
        assert_eq!(DEFAULT_DOCUMENTS, &["index.php", "index.html", "index.htm"]);
    }
}

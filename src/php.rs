//! PHP release naming and download-URL derivation.
//!
//! The upstream Windows distribution scheme is fixed: each release is a zip
//! named after the version, thread-safety variant, and the compiler-ABI
//! token of the toolchain that produced it. The token must match what the
//! host's runtime library expects, so the mapping here has to reproduce the
//! upstream rule exactly: releases from 8.4 onward are built with `vs17`,
//! everything earlier with `vs16`.

use crate::error::ProvisionError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Release host for Windows PHP builds.
const RELEASE_BASE: &str = "https://windows.php.net/downloads/releases";

/// First version line built with the newer toolchain.
const VS17_THRESHOLD: (u32, u32) = (8, 4);

/// Name of the CGI binary inside a release archive.
pub const CGI_BINARY: &str = "php-cgi.exe";

/// A dotted-triplet PHP version, e.g. `8.3.0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct PhpVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

/// Compiler-ABI token embedded in upstream archive names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiToken {
    Vs16,
    Vs17,
}

impl AbiToken {
    pub fn as_str(&self) -> &'static str {
        match self {
            AbiToken::Vs16 => "vs16",
            AbiToken::Vs17 => "vs17",
        }
    }
}

impl PhpVersion {
    /// Select the compiler-ABI token for this version.
    ///
    /// Monotonic on the threshold: anything `>= 8.4` (including `8.4.0`)
    /// selects [`AbiToken::Vs17`], anything below selects [`AbiToken::Vs16`].
    pub fn abi_token(&self) -> AbiToken {
        if (self.major, self.minor) >= VS17_THRESHOLD {
            AbiToken::Vs17
        } else {
            AbiToken::Vs16
        }
    }

    /// Archive file name for the non-thread-safe x64 build of this version.
    pub fn archive_name(&self) -> String {
        format!("php-{}-nts-Win32-{}-x64.zip", self, self.abi_token().as_str())
    }

    /// Full download URL under the fixed release host.
    pub fn download_url(&self) -> String {
        format!("{}/{}", RELEASE_BASE, self.archive_name())
    }
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for PhpVersion {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ProvisionError::InvalidSpec {
            message: format!("'{}' is not a dotted-triplet version (e.g. 8.3.0)", s),
        };

        let parts: Vec<&str> = s.split('.').collect();
        if parts.len() != 3 {
            return Err(invalid());
        }

        let parse = |p: &str| p.parse::<u32>().map_err(|_| invalid());
        Ok(PhpVersion {
            major: parse(parts[0])?,
            minor: parse(parts[1])?,
            patch: parse(parts[2])?,
        })
    }
}

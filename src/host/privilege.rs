//! Privilege query against the process identity.

use crate::error::Result;

/// Answers whether the running identity can mutate host-level configuration.
pub trait Privileges {
    /// True iff the process holds host-administrator authority.
    fn is_elevated(&self) -> Result<bool>;
}

/// Production implementation.
///
/// On Windows, `net session` succeeds only from an elevated shell, which is
/// the cheapest reliable probe without touching the token APIs. Everything
/// this tool mutates is Windows-only, so any other platform is never
/// considered elevated.
pub struct ShellPrivileges;

impl Privileges for ShellPrivileges {
    #[cfg(windows)]
    fn is_elevated(&self) -> Result<bool> {
        let (code, _) = super::run_capture("net", &["session"])?;
        Ok(code == 0)
    }

    #[cfg(not(windows))]
    fn is_elevated(&self) -> Result<bool> {
        Ok(false)
    }
}

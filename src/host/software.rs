//! Installed-software inventory and silent installer execution.

use crate::error::Result;
use std::path::Path;
use std::process::Command;

/// An entry from the host's installed-software inventory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstalledPackage {
    pub display_name: String,
}

/// Read-only view of what is installed on the host.
pub trait SoftwareInventory {
    /// First entry whose display name contains `pattern`, if any.
    fn find_display_name(&self, pattern: &str) -> Result<Option<InstalledPackage>>;
}

/// Launches a downloaded installer and reports its exit code.
pub trait InstallerRunner {
    /// Run `exe` with the given flags, blocking until it exits.
    fn run_silent(&self, exe: &Path, args: &[&str]) -> Result<i32>;
}

/// Inventory backed by the registry uninstall keys, read via `reg.exe`.
pub struct RegistryInventory;

const UNINSTALL_KEYS: &[&str] = &[
    r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Uninstall",
    r"HKLM\SOFTWARE\WOW6432Node\Microsoft\Windows\CurrentVersion\Uninstall",
];

impl SoftwareInventory for RegistryInventory {
    fn find_display_name(&self, pattern: &str) -> Result<Option<InstalledPackage>> {
        for key in UNINSTALL_KEYS {
            let (code, output) =
                super::run_capture("reg", &["query", key, "/s", "/v", "DisplayName"])?;
            if code != 0 {
                // A missing hive (32-bit-only host) is not an error.
                continue;
            }

            // Value lines look like "    DisplayName    REG_SZ    <name>"
            for line in output.lines() {
                let mut fields = line.trim().splitn(3, char::is_whitespace);
                if fields.next() != Some("DisplayName") {
                    continue;
                }
                let _reg_type = fields.next();
                if let Some(name) = fields.next() {
                    let name = name.trim();
                    if name.contains(pattern) {
                        return Ok(Some(InstalledPackage {
                            display_name: name.to_string(),
                        }));
                    }
                }
            }
        }
        Ok(None)
    }
}

/// Runs installers as plain child processes.
pub struct ProcessInstaller;

impl InstallerRunner for ProcessInstaller {
    fn run_silent(&self, exe: &Path, args: &[&str]) -> Result<i32> {
        let status = Command::new(exe).args(args).status()?;
        Ok(status.code().unwrap_or(-1))
    }
}

//! Filesystem access-control primitives.
//!
//! The contract is whole-list read and whole-list write; the
//! read-modify-write logic (which entry to replace, what to grant) lives in
//! the content step, not here. The write is a single set operation, so
//! concurrent external ACL edits during the call are not preserved.

use crate::error::{ProvisionError, Result};
use std::path::Path;
use std::process::Command;

/// Rights bucket an entry grants. Only the levels the provisioner deals
/// with are modeled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessRights {
    ReadExecute,
    Modify,
    FullControl,
}

impl AccessRights {
    /// The `FileSystemRights` name PowerShell expects.
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessRights::ReadExecute => "ReadAndExecute",
            AccessRights::Modify => "Modify",
            AccessRights::FullControl => "FullControl",
        }
    }

    fn from_rights_field(field: &str) -> Self {
        if field.contains("FullControl") {
            AccessRights::FullControl
        } else if field.contains("Modify") {
            AccessRights::Modify
        } else {
            AccessRights::ReadExecute
        }
    }
}

/// One allow rule on a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclEntry {
    pub identity: String,
    pub rights: AccessRights,
    /// Container + object inheritance: the rule flows to children.
    pub inherit_to_children: bool,
}

/// Whole-list access to a directory's ACL.
pub trait AclService {
    fn read(&self, path: &Path) -> Result<Vec<AclEntry>>;
    fn write(&self, path: &Path, entries: &[AclEntry]) -> Result<()>;
}

/// PowerShell-backed implementation (`Get-Acl` / `Set-Acl`).
pub struct PowerShellAcl;

impl PowerShellAcl {
    fn powershell(&self, script: &str, target: &Path) -> Result<String> {
        let output = Command::new("powershell")
            .args(["-NoProfile", "-NonInteractive", "-Command", script])
            .output()?;

        if !output.status.success() {
            return Err(ProvisionError::ConfigWriteFailed {
                target: format!("acl {}", target.display()),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl AclService for PowerShellAcl {
    fn read(&self, path: &Path) -> Result<Vec<AclEntry>> {
        let script = format!(
            "(Get-Acl -LiteralPath '{}').Access | ForEach-Object {{ \
             '{{0}}|{{1}}|{{2}}' -f $_.IdentityReference, $_.FileSystemRights, $_.InheritanceFlags }}",
            path.display()
        );
        let output = self.powershell(&script, path)?;

        let mut entries = Vec::new();
        for line in output.lines() {
            let mut parts = line.trim().split('|');
            let (Some(identity), Some(rights), Some(flags)) =
                (parts.next(), parts.next(), parts.next())
            else {
                continue;
            };
            entries.push(AclEntry {
                identity: identity.trim().to_string(),
                rights: AccessRights::from_rights_field(rights),
                inherit_to_children: flags.contains("ContainerInherit"),
            });
        }
        Ok(entries)
    }

    fn write(&self, path: &Path, entries: &[AclEntry]) -> Result<()> {
        let mut script = format!(
            "$acl = Get-Acl -LiteralPath '{0}'; \
             $acl.SetAccessRuleProtection($false, $true); \
             $acl.Access | ForEach-Object {{ $acl.RemoveAccessRule($_) | Out-Null }}; ",
            path.display()
        );
        for entry in entries {
            let flags = if entry.inherit_to_children {
                "'ContainerInherit,ObjectInherit'"
            } else {
                "'None'"
            };
            script.push_str(&format!(
                "$rule = New-Object System.Security.AccessControl.FileSystemAccessRule(\
                 '{}', '{}', {}, 'None', 'Allow'); $acl.AddAccessRule($rule); ",
                entry.identity,
                entry.rights.as_str(),
                flags
            ));
        }
        script.push_str(&format!("Set-Acl -LiteralPath '{}' -AclObject $acl", path.display()));

        self.powershell(&script, path)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rights_map_to_powershell_names() {
        assert_eq!(AccessRights::ReadExecute.as_str(), "ReadAndExecute");
        assert_eq!(AccessRights::FullControl.as_str(), "FullControl");
    }

    #[test]
    fn rights_parse_prefers_widest_grant() {
        assert_eq!(
            AccessRights::from_rights_field("FullControl"),
            AccessRights::FullControl
        );
        assert_eq!(
            AccessRights::from_rights_field("Modify, Synchronize"),
            AccessRights::Modify
        );
        assert_eq!(
            AccessRights::from_rights_field("ReadAndExecute, Synchronize"),
            AccessRights::ReadExecute
        );
    }
}

//! Content directory, placeholder page, and anonymous-access grant.

use crate::config::ANONYMOUS_IDENTITY;
use crate::error::Result;
use crate::host::acl::{AccessRights, AclEntry, AclService};
use crate::steps::StepReport;
use std::path::Path;

/// Placeholder page written when the directory has no `index.php` yet.
const PLACEHOLDER: &str = "<?php\nphpinfo();\n";

fn desired_grant() -> AclEntry {
    AclEntry {
        identity: ANONYMOUS_IDENTITY.to_string(),
        rights: AccessRights::ReadExecute,
        inherit_to_children: true,
    }
}

/// Ensure the content directory exists, holds an `index.php`, and grants
/// the anonymous identity read-and-execute.
///
/// Existing page content is never touched; only a missing `index.php` gets
/// the placeholder. The ACL update is read-modify-write: a matching grant
/// leaves the list alone, a stale grant for the same identity is replaced
/// in place, and otherwise the grant is appended. Entries for other
/// identities always survive.
pub fn ensure_content(path: &Path, acl: &dyn AclService) -> Result<StepReport> {
    let mut changes = Vec::new();

    if !path.is_dir() {
        std::fs::create_dir_all(path)?;
        changes.push("created directory");
    }

    let index = path.join("index.php");
    if !index.exists() {
        std::fs::write(&index, PLACEHOLDER)?;
        changes.push("wrote index.php");
    }

    let grant = desired_grant();
    let mut entries = acl.read(path)?;
    match entries.iter().position(|e| e.identity == grant.identity) {
        Some(at) if entries[at] == grant => {}
        Some(at) => {
            entries[at] = grant;
            acl.write(path, &entries)?;
            changes.push("updated acl grant");
        }
        None => {
            entries.push(grant);
            acl.write(path, &entries)?;
            changes.push("added acl grant");
        }
    }

    if changes.is_empty() {
        Ok(StepReport::unchanged(
            "content",
            format!("{} already prepared", path.display()),
        ))
    } else {
        Ok(StepReport::changed("content", changes.join(", ")))
    }
}

//! Collaborator interfaces around the host's external control planes.
//!
//! Every external, stateful system the pipeline converges against — the OS
//! feature manager, the installed-software inventory, the download
//! transport, the archive codec, the filesystem ACL store, and the web
//! server's configuration store — sits behind a narrow trait here. The
//! convergence steps are pure orchestration over these traits, so tests
//! substitute [`memory::MemoryHost`] and never touch real host state.
//!
//! Production adapters shell out to the stock Windows tooling (`dism.exe`,
//! `reg.exe`, `appcmd.exe`, PowerShell) or use reqwest/zip directly.

pub mod acl;
pub mod features;
pub mod memory;
pub mod privilege;
pub mod software;
pub mod transfer;
pub mod web;

use crate::error::Result;
use std::process::Command;

/// The full set of collaborators one convergence run needs.
///
/// Borrowed trait objects so tests can hand the same fake in for several
/// seams at once.
pub struct Host<'a> {
    pub privileges: &'a dyn privilege::Privileges,
    pub features: &'a dyn features::FeatureManager,
    pub inventory: &'a dyn software::SoftwareInventory,
    pub installer: &'a dyn software::InstallerRunner,
    pub downloader: &'a dyn transfer::Downloader,
    pub extractor: &'a dyn transfer::ArchiveExtractor,
    pub acl: &'a dyn acl::AclService,
    pub web: &'a dyn web::WebServer,
}

/// Run a program, capturing exit code and combined output.
///
/// Shared plumbing for the shelling adapters. A missing program or spawn
/// failure surfaces as an IO error; a nonzero exit is *not* an error here,
/// callers decide what each code means.
pub(crate) fn run_capture(program: &str, args: &[&str]) -> Result<(i32, String)> {
    let output = Command::new(program).args(args).output()?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        text.push_str(&String::from_utf8_lossy(&output.stderr));
    }

    let code = output.status.code().unwrap_or(-1);
    tracing::trace!(program, code, "ran host command");
    Ok((code, text))
}

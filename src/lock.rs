//! Site-scoped advisory run lock.
//!
//! Pool and site are mutated by name with no coordination from the web
//! server itself, so two simultaneous runs against the same site name would
//! interleave unpredictably. An exclusive lock on a lease file scoped to
//! the site name rejects the second run up front. The lock is advisory:
//! it only guards against other sitewright processes.

use crate::error::{ProvisionError, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Holds the exclusive lease for the duration of a run.
///
/// The flock is released when the guard drops; the lease file itself is
/// left behind, which is fine because acquisition never requires creating
/// it fresh.
#[derive(Debug)]
pub struct RunLock {
    file: File,
    path: PathBuf,
}

impl RunLock {
    /// Acquire the lease for `site` inside `dir`, failing immediately if
    /// another process already holds it.
    pub fn acquire_in(dir: &Path, site: &str) -> Result<Self> {
        let path = dir.join(lease_file_name(site));
        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)?;

        file.try_lock_exclusive()
            .map_err(|_| ProvisionError::AlreadyRunning {
                site: site.to_string(),
            })?;

        tracing::debug!(lease = %path.display(), "acquired run lock");
        Ok(RunLock { file, path })
    }

    /// Acquire the lease in the system temp directory.
    pub fn acquire(site: &str) -> Result<Self> {
        Self::acquire_in(&std::env::temp_dir(), site)
    }

    /// Path of the lease file backing this lock.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

/// Lease file name for a site, with path-hostile characters flattened.
fn lease_file_name(site: &str) -> String {
    let safe: String = site
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '.' || c == '-' { c } else { '_' })
        .collect();
    format!("sitewright-{}.lock", safe)
}

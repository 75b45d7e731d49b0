//! Visual C++ runtime convergence.
//!
//! PHP Windows builds link against the Visual C++ runtime, so the matching
//! redistributable has to be present before the interpreter can start.

use crate::error::{ProvisionError, Result};
use crate::host::software::{InstallerRunner, SoftwareInventory};
use crate::host::transfer::Downloader;
use crate::steps::StepReport;

/// Display-name substring that identifies an installed redistributable.
pub const RUNTIME_DISPLAY_NAME: &str = "Microsoft Visual C++ 2015-2022 Redistributable";

/// Fixed installer location published by the vendor.
pub const RUNTIME_URL: &str = "https://aka.ms/vs/17/release/vc_redist.x64.exe";

const SILENT_FLAGS: &[&str] = &["/install", "/quiet", "/norestart"];

/// Installer exit codes that count as converged: success, success with a
/// pending reboot, and "a newer version is already installed".
const ACCEPTED_EXIT_CODES: &[i32] = &[0, 3010, 1638];

/// Ensure the runtime redistributable is installed.
pub fn ensure_runtime(
    inventory: &dyn SoftwareInventory,
    installer: &dyn InstallerRunner,
    downloader: &dyn Downloader,
) -> Result<StepReport> {
    if let Some(package) = inventory.find_display_name(RUNTIME_DISPLAY_NAME)? {
        return Ok(StepReport::unchanged(
            "runtime",
            format!("found '{}'", package.display_name),
        ));
    }

    tracing::info!(url = RUNTIME_URL, "runtime missing, installing");

    // The temp file is removed when this binding drops, on every exit path.
    let download = tempfile::Builder::new()
        .prefix("vc_redist-")
        .suffix(".exe")
        .tempfile()?;

    downloader.fetch(RUNTIME_URL, download.path())?;
    let code = installer.run_silent(download.path(), SILENT_FLAGS)?;

    if !ACCEPTED_EXIT_CODES.contains(&code) {
        return Err(ProvisionError::PackageInstallFailed {
            package: "vc_redist.x64.exe".to_string(),
            code,
        });
    }

    Ok(StepReport::changed("runtime", format!("installed (exit {})", code)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;

    fn serving_host() -> MemoryHost {
        let host = MemoryHost::new();
        host.serve(RUNTIME_URL, b"MZ fake installer".to_vec());
        host
    }

    #[test]
    fn present_package_is_a_no_op() {
        let host = MemoryHost::new();
        host.seed_package("Microsoft Visual C++ 2015-2022 Redistributable (x64) - 14.38");

        let report = ensure_runtime(&host, &host, &host).unwrap();
        assert!(!report.changed);
        assert_eq!(host.installer_runs(), 0);
        assert_eq!(host.fetch_calls(), 0);
    }

    #[test]
    fn absent_package_downloads_and_installs() {
        let host = serving_host();

        let report = ensure_runtime(&host, &host, &host).unwrap();
        assert!(report.changed);
        assert_eq!(host.fetch_calls(), 1);
        assert_eq!(host.installer_runs(), 1);
    }

    #[test]
    fn accepted_exit_codes_converge() {
        for code in [0, 3010, 1638] {
            let host = serving_host();
            host.set_installer_exit(code);
            let report = ensure_runtime(&host, &host, &host).unwrap();
            assert!(report.changed, "exit {} should converge", code);
        }
    }

    #[test]
    fn unexpected_exit_code_is_fatal() {
        let host = serving_host();
        host.set_installer_exit(1603);

        let err = ensure_runtime(&host, &host, &host).unwrap_err();
        match err {
            ProvisionError::PackageInstallFailed { code, .. } => assert_eq!(code, 1603),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn download_failure_skips_the_installer() {
        let host = MemoryHost::new(); // RUNTIME_URL not served

        let err = ensure_runtime(&host, &host, &host).unwrap_err();
        assert!(matches!(err, ProvisionError::DownloadFailed { .. }));
        assert_eq!(host.installer_runs(), 0);
    }
}

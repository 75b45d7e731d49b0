//! Interpreter provisioning.

use crate::error::{ProvisionError, Result};
use crate::host::transfer::{ArchiveExtractor, Downloader};
use crate::php::{PhpVersion, CGI_BINARY};
use crate::steps::StepReport;
use std::path::{Path, PathBuf};

/// Ensure the versioned CGI binary exists under `install_path`, fetching
/// and unpacking the release archive if it is missing.
///
/// The existence check comes first on purpose: a binary already in place
/// short-circuits the step with zero network access. Returns the resolved
/// binary path for the handler-registration steps.
pub fn ensure_interpreter(
    version: PhpVersion,
    install_path: &Path,
    downloader: &dyn Downloader,
    extractor: &dyn ArchiveExtractor,
) -> Result<(StepReport, PathBuf)> {
    let binary = install_path.join(CGI_BINARY);

    if binary.exists() {
        return Ok((
            StepReport::unchanged("interpreter", format!("{} already at {}", version, binary.display())),
            binary,
        ));
    }

    let url = version.download_url();
    let status = downloader.probe(&url)?;
    if !(200..400).contains(&status) {
        return Err(ProvisionError::DownloadUnreachable { url, status });
    }

    tracing::info!(%version, url, "fetching interpreter");

    // Staging directory (and the archive in it) is removed when this
    // binding drops, on every exit path.
    let staging = tempfile::tempdir()?;
    let archive = staging.path().join(version.archive_name());
    downloader.fetch(&url, &archive)?;

    std::fs::create_dir_all(install_path)?;
    extractor.extract(&archive, install_path)?;

    // A clean extraction without the binary means a corrupt archive or an
    // upstream layout change; neither is recoverable here.
    if !binary.exists() {
        return Err(ProvisionError::ArchiveLayoutMismatch { expected: binary });
    }

    Ok((
        StepReport::changed("interpreter", format!("fetched {} into {}", version, install_path.display())),
        binary,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::transfer::ZipExtractor;
    use std::fs::File;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn version() -> PhpVersion {
        "8.3.0".parse().unwrap()
    }

    fn release_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buffer = std::io::Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buffer);
            for (name, body) in entries {
                writer
                    .start_file(name.to_string(), SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(body).unwrap();
            }
            writer.finish().unwrap();
        }
        buffer.into_inner()
    }

    #[test]
    fn existing_binary_short_circuits_without_network() {
        let temp = TempDir::new().unwrap();
        File::create(temp.path().join(CGI_BINARY)).unwrap();
        let host = MemoryHost::new();

        let (report, binary) =
            ensure_interpreter(version(), temp.path(), &host, &ZipExtractor).unwrap();

        assert!(!report.changed);
        assert_eq!(binary, temp.path().join(CGI_BINARY));
        assert_eq!(host.probe_calls(), 0);
        assert_eq!(host.fetch_calls(), 0);
    }

    #[test]
    fn missing_binary_fetches_and_unpacks() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("php83");
        let host = MemoryHost::new();
        host.serve(
            &version().download_url(),
            release_zip(&[(CGI_BINARY, b"bin"), ("php.exe", b"cli")]),
        );

        let (report, binary) =
            ensure_interpreter(version(), &install, &host, &ZipExtractor).unwrap();

        assert!(report.changed);
        assert!(binary.exists());
        assert!(install.join("php.exe").exists());
        assert_eq!(host.probe_calls(), 1);
        assert_eq!(host.fetch_calls(), 1);
    }

    #[test]
    fn unreachable_url_fails_before_download() {
        let temp = TempDir::new().unwrap();
        let host = MemoryHost::new(); // nothing served: probe answers 404

        let err = ensure_interpreter(version(), temp.path(), &host, &ZipExtractor).unwrap_err();
        match err {
            ProvisionError::DownloadUnreachable { status, .. } => assert_eq!(status, 404),
            other => panic!("unexpected error: {}", other),
        }
        assert_eq!(host.fetch_calls(), 0);
    }

    #[test]
    fn archive_without_the_binary_is_a_layout_mismatch() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("php83");
        let host = MemoryHost::new();
        host.serve(
            &version().download_url(),
            release_zip(&[("readme.txt", b"not a php release")]),
        );

        let err = ensure_interpreter(version(), &install, &host, &ZipExtractor).unwrap_err();
        assert!(matches!(err, ProvisionError::ArchiveLayoutMismatch { .. }));
    }

    #[test]
    fn second_call_reuses_the_fetched_binary() {
        let temp = TempDir::new().unwrap();
        let install = temp.path().join("php83");
        let host = MemoryHost::new();
        host.serve(&version().download_url(), release_zip(&[(CGI_BINARY, b"bin")]));

        ensure_interpreter(version(), &install, &host, &ZipExtractor).unwrap();
        let (report, _) =
            ensure_interpreter(version(), &install, &host, &ZipExtractor).unwrap();

        assert!(!report.changed);
        assert_eq!(host.fetch_calls(), 1);
    }
}

//! Download transport and archive extraction.
//!
//! The downloader wraps the HTTP client in a bounded retry-with-backoff
//! policy so the convergence steps stay retry-agnostic: they see eventual
//! success or a terminal failure, nothing in between.

use crate::error::{ProvisionError, Result};
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;
use std::time::Duration;

/// Fetches remote artifacts.
pub trait Downloader {
    /// Metadata-only reachability probe; returns the HTTP status code.
    fn probe(&self, url: &str) -> Result<u16>;

    /// Download `url` into the file at `dest`.
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// Unpacks a downloaded archive into a directory.
pub trait ArchiveExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()>;
}

/// Blocking HTTP downloader with bounded retry.
///
/// No overall request timeout is applied on purpose: interpreter archives
/// are tens of megabytes and slow links are common on fresh hosts. A hung
/// transfer blocks the run, which is the documented trade-off.
pub struct HttpDownloader {
    client: reqwest::blocking::Client,
    attempts: u32,
    backoff: Duration,
}

impl HttpDownloader {
    pub fn new() -> Self {
        Self::with_policy(3, Duration::from_millis(500))
    }

    /// Override the retry budget; the delay doubles after each failure.
    pub fn with_policy(attempts: u32, backoff: Duration) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("sitewright/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("client builder with static options");
        HttpDownloader {
            client,
            attempts: attempts.max(1),
            backoff,
        }
    }

    fn with_retry<T>(
        &self,
        url: &str,
        mut op: impl FnMut() -> std::result::Result<T, String>,
    ) -> Result<T> {
        let mut delay = self.backoff;
        let mut last_err = String::new();

        for attempt in 1..=self.attempts {
            match op() {
                Ok(value) => return Ok(value),
                Err(message) => {
                    tracing::warn!(url, attempt, %message, "transfer attempt failed");
                    last_err = message;
                    if attempt < self.attempts {
                        std::thread::sleep(delay);
                        delay *= 2;
                    }
                }
            }
        }

        Err(ProvisionError::DownloadFailed {
            url: url.to_string(),
            message: format!("{} (after {} attempts)", last_err, self.attempts),
        })
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

impl Downloader for HttpDownloader {
    fn probe(&self, url: &str) -> Result<u16> {
        self.with_retry(url, || {
            self.client
                .head(url)
                .send()
                .map(|response| response.status().as_u16())
                .map_err(|e| e.to_string())
        })
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        self.with_retry(url, || {
            let mut response = self.client.get(url).send().map_err(|e| e.to_string())?;
            if !response.status().is_success() {
                return Err(format!("server answered {}", response.status()));
            }
            let mut file = File::create(dest).map_err(|e| e.to_string())?;
            response.copy_to(&mut file).map_err(|e| e.to_string())?;
            Ok(())
        })
    }
}

/// Zip codec; interpreter release archives unpack flat into the
/// destination, so entry paths are preserved as-is.
pub struct ZipExtractor;

impl ArchiveExtractor for ZipExtractor {
    fn extract(&self, archive: &Path, dest: &Path) -> Result<()> {
        let failed = |message: String| ProvisionError::ExtractionFailed {
            archive: archive.to_path_buf(),
            message,
        };

        let file = File::open(archive)?;
        let mut zip = zip::ZipArchive::new(BufReader::new(file))
            .map_err(|e| failed(format!("not a readable zip: {}", e)))?;

        fs::create_dir_all(dest)?;

        for index in 0..zip.len() {
            let mut entry = zip
                .by_index(index)
                .map_err(|e| failed(format!("bad entry {}: {}", index, e)))?;

            let relative = entry
                .enclosed_name()
                .ok_or_else(|| failed(format!("entry {} has a hostile path", index)))?;
            let out_path = dest.join(relative);

            if entry.is_dir() {
                fs::create_dir_all(&out_path)?;
            } else {
                if let Some(parent) = out_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                let mut out = File::create(&out_path)?;
                std::io::copy(&mut entry, &mut out)?;
            }
        }

        tracing::debug!(archive = %archive.display(), dest = %dest.display(), "extracted archive");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let mut writer = zip::ZipWriter::new(File::create(path).unwrap());
        for (name, body) in entries {
            writer
                .start_file(name.to_string(), SimpleFileOptions::default())
                .unwrap();
            writer.write_all(body).unwrap();
        }
        writer.finish().unwrap();
    }

    #[test]
    fn zip_extractor_unpacks_flat_entries() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("release.zip");
        write_zip(&archive, &[("php-cgi.exe", b"bin"), ("ext/php_curl.dll", b"dll")]);

        let dest = temp.path().join("php");
        ZipExtractor.extract(&archive, &dest).unwrap();

        assert_eq!(fs::read(dest.join("php-cgi.exe")).unwrap(), b"bin");
        assert_eq!(fs::read(dest.join("ext/php_curl.dll")).unwrap(), b"dll");
    }

    #[test]
    fn zip_extractor_creates_destination() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("release.zip");
        write_zip(&archive, &[("a.txt", b"x")]);

        let dest = temp.path().join("deep/nested/dir");
        ZipExtractor.extract(&archive, &dest).unwrap();
        assert!(dest.join("a.txt").exists());
    }

    #[test]
    fn zip_extractor_rejects_garbage() {
        let temp = TempDir::new().unwrap();
        let archive = temp.path().join("broken.zip");
        fs::write(&archive, b"this is not a zip").unwrap();

        let err = ZipExtractor
            .extract(&archive, &temp.path().join("out"))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::ExtractionFailed { .. }));
    }
}

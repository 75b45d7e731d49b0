//! HTTP downloader tests against a local mock server.

use httpmock::prelude::*;
use httpmock::Method;
use sitewright::host::transfer::{Downloader, HttpDownloader};
use sitewright::ProvisionError;
use std::time::Duration;
use tempfile::TempDir;

fn fast_downloader() -> HttpDownloader {
    HttpDownloader::with_policy(3, Duration::from_millis(1))
}

#[test]
fn probe_reports_the_status_without_a_body() {
    let server = MockServer::start();
    let head = server.mock(|when, then| {
        when.method(Method::HEAD).path("/php.zip");
        then.status(200);
    });

    let status = fast_downloader().probe(&server.url("/php.zip")).unwrap();

    assert_eq!(status, 200);
    head.assert();
}

#[test]
fn probe_passes_404_through_without_retrying() {
    let server = MockServer::start();
    let head = server.mock(|when, then| {
        when.method(Method::HEAD).path("/missing.zip");
        then.status(404);
    });

    // A status code is an answer, not a transport failure.
    let status = fast_downloader().probe(&server.url("/missing.zip")).unwrap();

    assert_eq!(status, 404);
    head.assert_calls(1);
}

#[test]
fn fetch_writes_the_body_to_the_destination() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/php.zip");
        then.status(200).body(b"archive bytes");
    });
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("php.zip");

    fast_downloader().fetch(&server.url("/php.zip"), &dest).unwrap();

    assert_eq!(std::fs::read(&dest).unwrap(), b"archive bytes");
}

#[test]
fn fetch_retries_server_errors_until_the_budget_runs_out() {
    let server = MockServer::start();
    let get = server.mock(|when, then| {
        when.method(GET).path("/flaky.zip");
        then.status(503);
    });
    let temp = TempDir::new().unwrap();

    let err = fast_downloader()
        .fetch(&server.url("/flaky.zip"), &temp.path().join("flaky.zip"))
        .unwrap_err();

    get.assert_calls(3);
    match err {
        ProvisionError::DownloadFailed { message, .. } => {
            assert!(message.contains("after 3 attempts"), "{}", message);
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn fetch_recovers_when_the_server_comes_back() {
    let server = MockServer::start();
    let mut broken = server.mock(|when, then| {
        when.method(GET).path("/late.zip");
        then.status(500);
    });
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("late.zip");

    // First attempt fails; swap the endpoint to healthy before the retry.
    let downloader = HttpDownloader::with_policy(5, Duration::from_millis(50));
    let url = server.url("/late.zip");
    let handle = std::thread::spawn(move || downloader.fetch(&url, &dest));

    std::thread::sleep(Duration::from_millis(20));
    broken.delete();
    server.mock(|when, then| {
        when.method(GET).path("/late.zip");
        then.status(200).body(b"finally");
    });

    handle.join().unwrap().unwrap();
    assert_eq!(std::fs::read(temp.path().join("late.zip")).unwrap(), b"finally");
}

//! The convergence pipeline.
//!
//! Fixed step order: privileges, OS features, runtime, interpreter, FastCGI
//! registration, content directory, application pool, site, handler
//! mapping, default documents. Each step re-observes host state on every
//! run, so the pipeline as a whole is re-entrant; interrupting it and
//! running again picks up where the host actually is.

use crate::config::SiteSpec;
use crate::error::{ProvisionError, Result};
use crate::host::web::{SiteBinding, SiteDefinition};
use crate::host::Host;
use crate::steps;
use crate::steps::StepReport;
use std::time::Instant;

/// How a run ended, short of a fatal error.
#[derive(Debug)]
pub enum RunOutcome {
    /// Every step ran; the host matches the desired state.
    Converged { reports: Vec<StepReport> },

    /// Feature enablement needs a reboot; the run stopped there. Re-run
    /// after rebooting to finish convergence.
    RebootRequired { reports: Vec<StepReport> },
}

impl RunOutcome {
    /// Process exit code for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunOutcome::Converged { .. } => 0,
            RunOutcome::RebootRequired { .. } => 2,
        }
    }

    pub fn reports(&self) -> &[StepReport] {
        match self {
            RunOutcome::Converged { reports } | RunOutcome::RebootRequired { reports } => reports,
        }
    }
}

fn timed(run: impl FnOnce() -> Result<StepReport>) -> Result<StepReport> {
    let start = Instant::now();
    let mut report = run()?;
    report.duration_ms = start.elapsed().as_millis() as u64;
    Ok(report)
}

fn desired_site(spec: &SiteSpec) -> SiteDefinition {
    SiteDefinition {
        name: spec.site_name.clone(),
        physical_path: spec.content_path.clone(),
        // Pool name mirrors the site name.
        pool: spec.site_name.clone(),
        binding: SiteBinding {
            port: spec.port,
            host_header: spec.host_header.clone(),
        },
    }
}

/// Run the full pipeline against `host`, converging it to `spec`.
pub fn converge(host: &Host, spec: &SiteSpec) -> Result<RunOutcome> {
    if !host.privileges.is_elevated()? {
        return Err(ProvisionError::PrivilegeDenied);
    }

    let mut reports = Vec::new();

    let start = Instant::now();
    let features = steps::features::ensure_features(host.features, steps::features::IIS_FEATURES)?;
    let mut feature_report = features.report;
    feature_report.duration_ms = start.elapsed().as_millis() as u64;
    reports.push(feature_report);

    if features.reboot_required {
        tracing::warn!("a reboot is required before the web server is usable; stopping");
        return Ok(RunOutcome::RebootRequired { reports });
    }

    reports.push(timed(|| {
        steps::runtime::ensure_runtime(host.inventory, host.installer, host.downloader)
    })?);

    let start = Instant::now();
    let (mut interpreter_report, binary) = steps::interpreter::ensure_interpreter(
        spec.php_version,
        &spec.install_path,
        host.downloader,
        host.extractor,
    )?;
    interpreter_report.duration_ms = start.elapsed().as_millis() as u64;
    reports.push(interpreter_report);

    reports.push(timed(|| steps::fastcgi::ensure_fastcgi(host.web, &binary))?);
    reports.push(timed(|| steps::content::ensure_content(&spec.content_path, host.acl))?);
    reports.push(timed(|| steps::pool::ensure_pool(host.web, &spec.site_name))?);
    reports.push(timed(|| steps::site::ensure_site(host.web, &desired_site(spec)))?);
    reports.push(timed(|| {
        steps::handler_map::ensure_handler_mapping(host.web, &spec.site_name, &binary)
    })?);
    reports.push(timed(|| {
        steps::default_docs::ensure_default_documents(host.web, &spec.site_name)
    })?);

    Ok(RunOutcome::Converged { reports })
}

//! Sitewright CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use console::style;
use sitewright::cli::Cli;
use sitewright::config::SiteSpec;
use sitewright::host::acl::PowerShellAcl;
use sitewright::host::features::DismFeatures;
use sitewright::host::privilege::ShellPrivileges;
use sitewright::host::software::{ProcessInstaller, RegistryInventory};
use sitewright::host::transfer::{HttpDownloader, ZipExtractor};
use sitewright::host::web::AppCmd;
use sitewright::host::Host;
use sitewright::lock::RunLock;
use sitewright::pipeline::{self, RunOutcome};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
///
/// Log level is controlled by:
/// 1. `--debug` flag sets level to DEBUG
/// 2. `RUST_LOG` environment variable (if set)
/// 3. Default is INFO
fn init_tracing(debug: bool) {
    let filter = if debug {
        EnvFilter::new("sitewright=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sitewright=info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false))
        .with(filter)
        .init();
}

fn report(outcome: &RunOutcome, cli: &Cli) {
    if cli.json {
        let body = serde_json::json!({
            "converged": matches!(outcome, RunOutcome::Converged { .. }),
            "reboot_required": matches!(outcome, RunOutcome::RebootRequired { .. }),
            "steps": outcome.reports(),
        });
        println!("{}", body);
        return;
    }

    if !cli.quiet {
        for step in outcome.reports() {
            println!("  {}", step.summary_line());
        }
    }

    match outcome {
        RunOutcome::Converged { .. } => {
            println!("{}", style("Host converged.").green().bold());
        }
        RunOutcome::RebootRequired { .. } => {
            println!(
                "{}",
                style("Reboot required. Re-run sitewright after rebooting.")
                    .yellow()
                    .bold()
            );
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.debug);

    tracing::debug!("sitewright starting with args: {:?}", cli);

    let run = || -> sitewright::Result<RunOutcome> {
        let spec = SiteSpec::from_cli(&cli)?;
        let _lock = RunLock::acquire(&spec.site_name)?;

        let downloader = HttpDownloader::new();
        let web = AppCmd::new();
        let host = Host {
            privileges: &ShellPrivileges,
            features: &DismFeatures,
            inventory: &RegistryInventory,
            installer: &ProcessInstaller,
            downloader: &downloader,
            extractor: &ZipExtractor,
            acl: &PowerShellAcl,
            web: &web,
        };

        pipeline::converge(&host, &spec)
    };

    match run() {
        Ok(outcome) => {
            report(&outcome, &cli);
            ExitCode::from(outcome.exit_code() as u8)
        }
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            ExitCode::from(1)
        }
    }
}

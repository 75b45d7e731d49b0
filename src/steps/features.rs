//! OS feature convergence.

use crate::error::{ProvisionError, Result};
use crate::host::features::FeatureManager;
use crate::steps::StepReport;

/// Optional features the web server and CGI pipeline need.
pub const IIS_FEATURES: &[&str] = &[
    "IIS-WebServerRole",
    "IIS-WebServer",
    "IIS-CommonHttpFeatures",
    "IIS-StaticContent",
    "IIS-DefaultDocument",
    "IIS-CGI",
];

/// Step result plus the aggregate reboot flag.
#[derive(Debug)]
pub struct FeatureOutcome {
    pub report: StepReport,
    /// True if any feature needs a reboot before it is usable. The
    /// pipeline must stop after this step when set.
    pub reboot_required: bool,
}

/// Ensure every named feature is enabled, aggregating the reboot flag.
///
/// A failure to enable one feature aborts the run identifying that
/// feature; features already enabled earlier in the list stay enabled (no
/// rollback).
pub fn ensure_features(
    manager: &dyn FeatureManager,
    names: &[&str],
) -> Result<FeatureOutcome> {
    let mut enabled_now = Vec::new();
    let mut reboot_required = false;

    for name in names {
        let failed = |message: String| ProvisionError::FeatureEnableFailed {
            feature: name.to_string(),
            message,
        };

        let state = manager
            .state(name)
            .map_err(|e| failed(format!("state query failed: {}", e)))?;
        if state.enabled {
            reboot_required |= state.pending_reboot;
            tracing::debug!(feature = name, "already enabled");
            continue;
        }

        tracing::info!(feature = name, "enabling");
        let outcome = manager.enable(name).map_err(|e| failed(e.to_string()))?;
        reboot_required |= outcome.reboot_required;
        enabled_now.push(*name);
    }

    let report = if enabled_now.is_empty() {
        StepReport::unchanged("features", format!("{} already enabled", names.len()))
    } else {
        StepReport::changed("features", format!("enabled {}", enabled_now.join(", ")))
    };

    Ok(FeatureOutcome {
        report,
        reboot_required,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;

    #[test]
    fn enables_missing_features() {
        let host = MemoryHost::new();
        let outcome = ensure_features(&host, &["IIS-WebServer", "IIS-CGI"]).unwrap();

        assert!(outcome.report.changed);
        assert!(!outcome.reboot_required);
        assert!(host.feature_enabled("IIS-WebServer"));
        assert!(host.feature_enabled("IIS-CGI"));
    }

    #[test]
    fn skips_features_already_enabled() {
        let host = MemoryHost::new();
        host.seed_feature("IIS-WebServer", true, false);
        host.seed_feature("IIS-CGI", true, false);

        let outcome = ensure_features(&host, &["IIS-WebServer", "IIS-CGI"]).unwrap();
        assert!(!outcome.report.changed);
        assert!(host.ops().is_empty());
    }

    #[test]
    fn aggregates_reboot_flag_across_features() {
        let host = MemoryHost::new();
        host.reboot_on_enable("IIS-CGI");

        let outcome = ensure_features(&host, &["IIS-WebServer", "IIS-CGI"]).unwrap();
        assert!(outcome.reboot_required);
    }

    #[test]
    fn pending_reboot_on_enabled_feature_counts() {
        let host = MemoryHost::new();
        host.seed_feature("IIS-WebServer", true, true);

        let outcome = ensure_features(&host, &["IIS-WebServer"]).unwrap();
        assert!(!outcome.report.changed);
        assert!(outcome.reboot_required);
    }

    #[test]
    fn enable_failure_identifies_the_feature() {
        let host = MemoryHost::new();
        host.fail_enable("IIS-CGI");

        let err = ensure_features(&host, &["IIS-WebServer", "IIS-CGI"]).unwrap_err();
        match err {
            ProvisionError::FeatureEnableFailed { feature, .. } => {
                assert_eq!(feature, "IIS-CGI");
            }
            other => panic!("unexpected error: {}", other),
        }
        // The earlier feature stays enabled; there is no rollback.
        assert!(host.feature_enabled("IIS-WebServer"));
    }

    #[test]
    fn state_query_failure_is_reported_as_a_query_failure() {
        let host = MemoryHost::new();
        host.fail_state("IIS-WebServer");

        let err = ensure_features(&host, &["IIS-WebServer"]).unwrap_err();
        match err {
            ProvisionError::FeatureEnableFailed { feature, message } => {
                assert_eq!(feature, "IIS-WebServer");
                assert!(message.contains("state query failed"), "{}", message);
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn default_feature_set_covers_cgi() {
        assert!(IIS_FEATURES.contains(&"IIS-CGI"));
        assert!(IIS_FEATURES.contains(&"IIS-WebServerRole"));
    }
}

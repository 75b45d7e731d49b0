//! OS optional-feature query and mutation.

use crate::error::Result;
use anyhow::anyhow;
use regex::Regex;

/// Observed state of a named optional feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeatureState {
    pub enabled: bool,
    /// The feature is (or will be) enabled but a reboot is still owed.
    pub pending_reboot: bool,
}

/// Result of requesting an enable.
#[derive(Debug, Clone, Copy)]
pub struct EnableOutcome {
    pub reboot_required: bool,
}

/// Query and mutate host optional features.
pub trait FeatureManager {
    fn state(&self, name: &str) -> Result<FeatureState>;

    /// Enable the feature with its dependencies, without restarting.
    fn enable(&self, name: &str) -> Result<EnableOutcome>;
}

/// `dism.exe`-backed implementation.
pub struct DismFeatures;

/// DISM's "operation completed but a restart is owed" exit code.
const DISM_REBOOT_REQUIRED: i32 = 3010;

impl FeatureManager for DismFeatures {
    fn state(&self, name: &str) -> Result<FeatureState> {
        let (code, output) = super::run_capture(
            "dism",
            &[
                "/online",
                "/get-featureinfo",
                &format!("/featurename:{}", name),
                "/english",
            ],
        )?;
        if code != 0 {
            return Err(anyhow!("dism query for '{}' exited with code {}", name, code).into());
        }

        // "State : Enabled" / "State : Disabled" / "State : Enable Pending"
        let re = Regex::new(r"(?m)^State\s*:\s*(.+?)\s*$").expect("static regex");
        let state = re
            .captures(&output)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str())
            .ok_or_else(|| anyhow!("dism output for '{}' carried no State line", name))?;

        Ok(FeatureState {
            enabled: state.starts_with("Enable"),
            pending_reboot: state.contains("Pending"),
        })
    }

    fn enable(&self, name: &str) -> Result<EnableOutcome> {
        let (code, output) = super::run_capture(
            "dism",
            &[
                "/online",
                "/enable-feature",
                &format!("/featurename:{}", name),
                "/all",
                "/norestart",
            ],
        )?;

        match code {
            0 => Ok(EnableOutcome {
                reboot_required: false,
            }),
            DISM_REBOOT_REQUIRED => Ok(EnableOutcome {
                reboot_required: true,
            }),
            _ => Err(anyhow!(
                "dism exited with code {}: {}",
                code,
                output.lines().last().unwrap_or("").trim()
            )
            .into()),
        }
    }
}

//! Convergence steps.
//!
//! One module per step of the pipeline. Every step follows the same
//! discipline: observe the current state through a collaborator trait,
//! compare it to the desired state, mutate only the delta, and report what
//! happened. Steps are independent and re-entrant; ordering lives in
//! [`crate::pipeline`].

pub mod content;
pub mod default_docs;
pub mod fastcgi;
pub mod features;
pub mod handler_map;
pub mod interpreter;
pub mod pool;
pub mod runtime;
pub mod site;

use serde::Serialize;

/// What a single step did to the host.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Step name.
    pub name: &'static str,

    /// Whether the host diverged from the desired state and was mutated.
    pub changed: bool,

    /// Human-readable note on what was found or done.
    pub detail: String,

    /// Execution duration, filled in by the pipeline.
    pub duration_ms: u64,
}

impl StepReport {
    /// The host already matched; nothing was mutated.
    pub fn unchanged(name: &'static str, detail: impl Into<String>) -> Self {
        StepReport {
            name,
            changed: false,
            detail: detail.into(),
            duration_ms: 0,
        }
    }

    /// The host diverged and was brought to the desired state.
    pub fn changed(name: &'static str, detail: impl Into<String>) -> Self {
        StepReport {
            name,
            changed: true,
            detail: detail.into(),
            duration_ms: 0,
        }
    }

    /// Generate a summary line for display.
    pub fn summary_line(&self) -> String {
        let marker = if self.changed { '✓' } else { '≡' };
        format!("{} {} ({})", marker, self.name, self.detail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn changed_report_uses_check_marker() {
        let report = StepReport::changed("pool", "created");
        assert!(report.changed);
        assert_eq!(report.summary_line(), "✓ pool (created)");
    }

    #[test]
    fn unchanged_report_uses_identity_marker() {
        let report = StepReport::unchanged("interpreter", "already present");
        assert!(!report.changed);
        assert!(report.summary_line().starts_with('≡'));
    }

    #[test]
    fn report_serializes_for_json_output() {
        let report = StepReport::changed("site", "created");
        let json = serde_json::to_string(&report).unwrap();
        assert!(json.contains("\"name\":\"site\""));
        assert!(json.contains("\"changed\":true"));
    }
}

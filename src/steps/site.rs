//! Website convergence.

use crate::error::Result;
use crate::host::web::{SiteDefinition, WebServer};
use crate::steps::StepReport;

/// Ensure a site exists matching `desired` exactly and is started.
///
/// The existing definition is compared field by field. A full match leaves
/// the site alone; any divergence (path, pool, or binding) rebuilds the
/// site, since binding edits through the store are not reliably atomic. A
/// matching site that is merely stopped is just started.
pub fn ensure_site(web: &dyn WebServer, desired: &SiteDefinition) -> Result<StepReport> {
    let name = desired.name.as_str();

    let detail = match web.site_definition(name)? {
        None => {
            tracing::info!(site = name, "creating site");
            web.create_site(desired)?;
            Some(format!("created {}", name))
        }
        Some(existing) if existing == *desired => None,
        Some(existing) => {
            tracing::info!(
                site = name,
                old_binding = existing.binding.information(),
                new_binding = desired.binding.information(),
                "definition diverged, rebinding"
            );
            web.delete_site(name)?;
            web.create_site(desired)?;
            Some(format!("rebound {}", name))
        }
    };

    let mut started_now = false;
    if !web.site_started(name)? {
        web.start_site(name)?;
        started_now = true;
    }

    match detail {
        Some(detail) => Ok(StepReport::changed("site", detail)),
        None if started_now => Ok(StepReport::changed("site", format!("started {}", name))),
        None => Ok(StepReport::unchanged("site", format!("{} up to date", name))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::memory::MemoryHost;
    use crate::host::web::SiteBinding;
    use crate::host::web::WebServer as _;
    use std::path::PathBuf;

    fn desired() -> SiteDefinition {
        SiteDefinition {
            name: "test.local".into(),
            physical_path: PathBuf::from("/srv/test"),
            pool: "test.local".into(),
            binding: SiteBinding {
                port: 8080,
                host_header: "test.local".into(),
            },
        }
    }

    #[test]
    fn missing_site_is_created_and_started() {
        let host = MemoryHost::new();

        let report = ensure_site(&host, &desired()).unwrap();

        assert!(report.changed);
        assert_eq!(host.site("test.local"), Some(desired()));
        assert!(host.site_started("test.local").unwrap());
    }

    #[test]
    fn matching_site_is_left_alone() {
        let host = MemoryHost::new();
        ensure_site(&host, &desired()).unwrap();
        host.clear_ops();

        let report = ensure_site(&host, &desired()).unwrap();

        assert!(!report.changed);
        assert!(host.ops().is_empty());
    }

    #[test]
    fn diverged_binding_rebuilds_the_site() {
        let host = MemoryHost::new();
        let mut stale = desired();
        stale.binding.port = 80;
        host.create_site(&stale).unwrap();
        host.clear_ops();

        let report = ensure_site(&host, &desired()).unwrap();

        assert!(report.changed);
        assert_eq!(host.site("test.local"), Some(desired()));
        assert_eq!(
            host.ops(),
            vec![
                "delete-site test.local",
                "create-site test.local",
                "start-site test.local",
            ]
        );
    }

    #[test]
    fn stopped_matching_site_is_only_started() {
        let host = MemoryHost::new();
        host.create_site(&desired()).unwrap();
        host.clear_ops();

        let report = ensure_site(&host, &desired()).unwrap();

        assert!(report.changed);
        assert_eq!(host.ops(), vec!["start-site test.local"]);
    }
}

//! Site-scoped PHP handler mapping.

use crate::error::Result;
use crate::host::web::{HandlerMapping, WebServer};
use crate::steps::StepReport;
use std::path::Path;

/// Name of the mapping this provisioner owns.
pub const MAPPING_NAME: &str = "PHP-FastCGI";

const MAPPING_PATH: &str = "*.php";
const MAPPING_VERBS: &str = "GET,HEAD,POST";

/// Ensure the site maps `*.php` to the CGI binary through the FastCGI
/// module.
///
/// First registration wins: an existing mapping under [`MAPPING_NAME`] is
/// kept as-is even when its script processor points at a different binary.
/// Anyone who edited the mapping by hand owns it from then on.
pub fn ensure_handler_mapping(
    web: &dyn WebServer,
    site: &str,
    binary: &Path,
) -> Result<StepReport> {
    if let Some(existing) = web.handler_mapping(site, MAPPING_NAME)? {
        return Ok(StepReport::unchanged(
            "handler-map",
            format!("{} -> {}", MAPPING_NAME, existing.executable.display()),
        ));
    }

    let mapping = HandlerMapping {
        name: MAPPING_NAME.to_string(),
        path: MAPPING_PATH.to_string(),
        verbs: MAPPING_VERBS.to_string(),
        executable: binary.to_path_buf(),
    };
    web.add_handler_mapping(site, &mapping)?;

    Ok(StepReport::changed(
        "handler-map",
        format!("mapped {} to {}", MAPPING_PATH, binary.display()),
    ))
}

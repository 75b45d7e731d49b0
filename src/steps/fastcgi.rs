//! Global FastCGI process-handler registration.

use crate::error::Result;
use crate::host::web::WebServer;
use crate::steps::StepReport;
use std::path::Path;

/// Concurrency ceiling for the registered process.
pub const MAX_INSTANCES: u32 = 4;

/// Ensure the CGI binary is registered in the global FastCGI process
/// registry. Idempotent by exact executable-path match; repeated runs never
/// produce a duplicate entry.
pub fn ensure_fastcgi(web: &dyn WebServer, binary: &Path) -> Result<StepReport> {
    if web.fastcgi_registered(binary)? {
        return Ok(StepReport::unchanged(
            "fastcgi",
            format!("{} already registered", binary.display()),
        ));
    }

    web.register_fastcgi(binary, MAX_INSTANCES)?;
    Ok(StepReport::changed(
        "fastcgi",
        format!("registered {}", binary.display()),
    ))
}

//! Default-document list at site scope.

use crate::config::DEFAULT_DOCUMENTS;
use crate::error::Result;
use crate::host::web::WebServer;
use crate::steps::StepReport;

/// Enable default documents on the site and replace the ordered candidate
/// list with [`DEFAULT_DOCUMENTS`].
///
/// Always a full replace: `index.php` must sit first, and a positional diff
/// against inherited server-level entries is not worth the ambiguity. The
/// step reports unchanged since the end state is the same on every run.
pub fn ensure_default_documents(web: &dyn WebServer, site: &str) -> Result<StepReport> {
    let documents: Vec<String> = DEFAULT_DOCUMENTS.iter().map(|d| d.to_string()).collect();
    web.set_default_documents(site, &documents)?;

    Ok(StepReport::unchanged(
        "default-docs",
        format!("{} candidates set", documents.len()),
    ))
}

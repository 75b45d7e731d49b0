//! Application pool convergence.

use crate::error::Result;
use crate::host::web::{PoolSettings, WebServer};
use crate::steps::StepReport;

fn desired_settings() -> PoolSettings {
    // The CGI pipeline carries the interpreter; the pool itself hosts no
    // managed runtime and stays 64-bit.
    PoolSettings {
        runtime_version: String::new(),
        enable_32bit: false,
    }
}

/// Ensure the pool exists and carries the desired settings.
///
/// Settings are written on every run; the store treats an identical write
/// as a no-op, and reading them back costs as much as writing them. A
/// running pool is stopped for the write and restarted afterwards, so
/// worker processes pick the settings up.
pub fn ensure_pool(web: &dyn WebServer, name: &str) -> Result<StepReport> {
    let created = if web.pool_exists(name)? {
        false
    } else {
        tracing::info!(pool = name, "creating application pool");
        web.create_pool(name)?;
        true
    };

    let was_running = web.pool_running(name)?;
    if was_running {
        web.stop_pool(name)?;
    }
    web.configure_pool(name, &desired_settings())?;
    if was_running {
        web.start_pool(name)?;
    }

    if created {
        Ok(StepReport::changed("pool", format!("created {}", name)))
    } else {
        Ok(StepReport::unchanged("pool", format!("{} configured", name)))
    }
}

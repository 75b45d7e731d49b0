//! In-memory host for tests.
//!
//! [`MemoryHost`] implements every collaborator trait over plain maps, with
//! an operation log of mutations and knobs for failure injection. It plays
//! the role real host state plays in production, so the whole pipeline can
//! be exercised without a Windows machine.

use crate::error::{ProvisionError, Result};
use crate::host::acl::{AclEntry, AclService};
use crate::host::features::{EnableOutcome, FeatureManager, FeatureState};
use crate::host::privilege::Privileges;
use crate::host::software::{InstalledPackage, InstallerRunner, SoftwareInventory};
use crate::host::transfer::Downloader;
use crate::host::web::{HandlerMapping, PoolSettings, SiteDefinition, WebServer};
use anyhow::anyhow;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

#[derive(Debug, Default, Clone)]
struct PoolEntry {
    settings: Option<PoolSettings>,
    running: bool,
}

#[derive(Debug, Clone)]
struct SiteEntry {
    definition: SiteDefinition,
    started: bool,
}

#[derive(Debug, Default)]
struct State {
    elevated: bool,
    features: HashMap<String, (bool, bool)>, // (enabled, pending_reboot)
    reboot_on_enable: HashSet<String>,
    fail_enable: HashSet<String>,
    fail_state: HashSet<String>,
    packages: Vec<String>,
    installer_exit: i32,
    install_registers: Option<String>,
    installer_runs: usize,
    remote: HashMap<String, Vec<u8>>,
    probe_calls: usize,
    fetch_calls: usize,
    acls: HashMap<PathBuf, Vec<AclEntry>>,
    fastcgi: Vec<(PathBuf, u32)>,
    pools: HashMap<String, PoolEntry>,
    sites: HashMap<String, SiteEntry>,
    mappings: HashMap<String, Vec<HandlerMapping>>,
    default_docs: HashMap<String, Vec<String>>,
    ops: Vec<String>,
}

/// Fake host; starts elevated, with nothing enabled, installed, or served.
pub struct MemoryHost {
    state: Mutex<State>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        MemoryHost {
            state: Mutex::new(State {
                elevated: true,
                ..State::default()
            }),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().expect("memory host poisoned")
    }

    // --- setup knobs ---

    pub fn set_elevated(&self, elevated: bool) {
        self.lock().elevated = elevated;
    }

    pub fn seed_feature(&self, name: &str, enabled: bool, pending_reboot: bool) {
        self.lock()
            .features
            .insert(name.to_string(), (enabled, pending_reboot));
    }

    /// Make `enable(name)` report that a reboot is required.
    pub fn reboot_on_enable(&self, name: &str) {
        self.lock().reboot_on_enable.insert(name.to_string());
    }

    /// Make `enable(name)` fail.
    pub fn fail_enable(&self, name: &str) {
        self.lock().fail_enable.insert(name.to_string());
    }

    /// Make `state(name)` fail.
    pub fn fail_state(&self, name: &str) {
        self.lock().fail_state.insert(name.to_string());
    }

    pub fn seed_package(&self, display_name: &str) {
        self.lock().packages.push(display_name.to_string());
    }

    pub fn set_installer_exit(&self, code: i32) {
        self.lock().installer_exit = code;
    }

    /// After a successful installer run, register this display name in the
    /// inventory, the way a real installer would.
    pub fn on_install_register(&self, display_name: &str) {
        self.lock().install_registers = Some(display_name.to_string());
    }

    /// Serve `bytes` for `url`; unserved URLs probe as 404 and fail to fetch.
    pub fn serve(&self, url: &str, bytes: Vec<u8>) {
        self.lock().remote.insert(url.to_string(), bytes);
    }

    // --- observation ---

    pub fn ops(&self) -> Vec<String> {
        self.lock().ops.clone()
    }

    pub fn clear_ops(&self) {
        self.lock().ops.clear();
    }

    pub fn feature_enabled(&self, name: &str) -> bool {
        self.lock().features.get(name).map(|f| f.0).unwrap_or(false)
    }

    pub fn installer_runs(&self) -> usize {
        self.lock().installer_runs
    }

    pub fn probe_calls(&self) -> usize {
        self.lock().probe_calls
    }

    pub fn fetch_calls(&self) -> usize {
        self.lock().fetch_calls
    }

    pub fn fastcgi_paths(&self) -> Vec<PathBuf> {
        self.lock().fastcgi.iter().map(|(p, _)| p.clone()).collect()
    }

    pub fn acl_entries(&self, path: &Path) -> Vec<AclEntry> {
        self.lock().acls.get(path).cloned().unwrap_or_default()
    }

    pub fn site(&self, name: &str) -> Option<SiteDefinition> {
        self.lock().sites.get(name).map(|s| s.definition.clone())
    }

    pub fn pool_settings(&self, name: &str) -> Option<PoolSettings> {
        self.lock().pools.get(name).and_then(|p| p.settings.clone())
    }

    pub fn default_documents(&self, site: &str) -> Vec<String> {
        self.lock().default_docs.get(site).cloned().unwrap_or_default()
    }

    pub fn mapping_names(&self, site: &str) -> Vec<String> {
        self.lock()
            .mappings
            .get(site)
            .map(|ms| ms.iter().map(|m| m.name.clone()).collect())
            .unwrap_or_default()
    }
}

impl Privileges for MemoryHost {
    fn is_elevated(&self) -> Result<bool> {
        Ok(self.lock().elevated)
    }
}

impl FeatureManager for MemoryHost {
    fn state(&self, name: &str) -> Result<FeatureState> {
        let state = self.lock();
        if state.fail_state.contains(name) {
            return Err(anyhow!("simulated state-query failure").into());
        }
        let (enabled, pending_reboot) = state.features.get(name).copied().unwrap_or((false, false));
        Ok(FeatureState {
            enabled,
            pending_reboot,
        })
    }

    fn enable(&self, name: &str) -> Result<EnableOutcome> {
        let mut state = self.lock();
        if state.fail_enable.contains(name) {
            return Err(anyhow!("simulated enable failure").into());
        }
        let reboot = state.reboot_on_enable.contains(name);
        state.features.insert(name.to_string(), (true, reboot));
        state.ops.push(format!("enable-feature {}", name));
        Ok(EnableOutcome {
            reboot_required: reboot,
        })
    }
}

impl SoftwareInventory for MemoryHost {
    fn find_display_name(&self, pattern: &str) -> Result<Option<InstalledPackage>> {
        Ok(self
            .lock()
            .packages
            .iter()
            .find(|name| name.contains(pattern))
            .map(|name| InstalledPackage {
                display_name: name.clone(),
            }))
    }
}

impl InstallerRunner for MemoryHost {
    fn run_silent(&self, exe: &Path, _args: &[&str]) -> Result<i32> {
        let mut state = self.lock();
        state.installer_runs += 1;
        state.ops.push(format!("run-installer {}", exe.display()));
        let code = state.installer_exit;
        if matches!(code, 0 | 3010) {
            if let Some(name) = state.install_registers.clone() {
                state.packages.push(name);
            }
        }
        Ok(code)
    }
}

impl Downloader for MemoryHost {
    fn probe(&self, url: &str) -> Result<u16> {
        let mut state = self.lock();
        state.probe_calls += 1;
        Ok(if state.remote.contains_key(url) { 200 } else { 404 })
    }

    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        let mut state = self.lock();
        state.fetch_calls += 1;
        state.ops.push(format!("fetch {}", url));
        let bytes = state
            .remote
            .get(url)
            .ok_or_else(|| ProvisionError::DownloadFailed {
                url: url.to_string(),
                message: "not served by fake".to_string(),
            })?;
        std::fs::write(dest, bytes)?;
        Ok(())
    }
}

impl AclService for MemoryHost {
    fn read(&self, path: &Path) -> Result<Vec<AclEntry>> {
        Ok(self.acl_entries(path))
    }

    fn write(&self, path: &Path, entries: &[AclEntry]) -> Result<()> {
        let mut state = self.lock();
        state.acls.insert(path.to_path_buf(), entries.to_vec());
        state.ops.push(format!("write-acl {}", path.display()));
        Ok(())
    }
}

impl WebServer for MemoryHost {
    fn fastcgi_registered(&self, executable: &Path) -> Result<bool> {
        Ok(self.lock().fastcgi.iter().any(|(p, _)| p == executable))
    }

    fn register_fastcgi(&self, executable: &Path, max_instances: u32) -> Result<()> {
        let mut state = self.lock();
        state.fastcgi.push((executable.to_path_buf(), max_instances));
        state
            .ops
            .push(format!("register-fastcgi {}", executable.display()));
        Ok(())
    }

    fn pool_exists(&self, name: &str) -> Result<bool> {
        Ok(self.lock().pools.contains_key(name))
    }

    fn create_pool(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        // New pools come up started, as on a real host.
        state.pools.insert(
            name.to_string(),
            PoolEntry {
                settings: None,
                running: true,
            },
        );
        state.ops.push(format!("create-pool {}", name));
        Ok(())
    }

    fn pool_running(&self, name: &str) -> Result<bool> {
        Ok(self.lock().pools.get(name).map(|p| p.running).unwrap_or(false))
    }

    fn stop_pool(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if let Some(pool) = state.pools.get_mut(name) {
            pool.running = false;
        }
        state.ops.push(format!("stop-pool {}", name));
        Ok(())
    }

    fn start_pool(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if let Some(pool) = state.pools.get_mut(name) {
            pool.running = true;
        }
        state.ops.push(format!("start-pool {}", name));
        Ok(())
    }

    fn configure_pool(&self, name: &str, settings: &PoolSettings) -> Result<()> {
        let mut state = self.lock();
        let pool = state
            .pools
            .get_mut(name)
            .ok_or_else(|| ProvisionError::ConfigWriteFailed {
                target: format!("apppool {}", name),
                message: "pool does not exist".to_string(),
            })?;
        pool.settings = Some(settings.clone());
        state.ops.push(format!("configure-pool {}", name));
        Ok(())
    }

    fn site_definition(&self, name: &str) -> Result<Option<SiteDefinition>> {
        Ok(self.site(name))
    }

    fn create_site(&self, definition: &SiteDefinition) -> Result<()> {
        let mut state = self.lock();
        state.sites.insert(
            definition.name.clone(),
            SiteEntry {
                definition: definition.clone(),
                started: false,
            },
        );
        state.ops.push(format!("create-site {}", definition.name));
        Ok(())
    }

    fn delete_site(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        state.sites.remove(name);
        state.ops.push(format!("delete-site {}", name));
        Ok(())
    }

    fn site_started(&self, name: &str) -> Result<bool> {
        Ok(self.lock().sites.get(name).map(|s| s.started).unwrap_or(false))
    }

    fn start_site(&self, name: &str) -> Result<()> {
        let mut state = self.lock();
        if let Some(site) = state.sites.get_mut(name) {
            site.started = true;
        }
        state.ops.push(format!("start-site {}", name));
        Ok(())
    }

    fn handler_mapping(&self, site: &str, name: &str) -> Result<Option<HandlerMapping>> {
        Ok(self
            .lock()
            .mappings
            .get(site)
            .and_then(|ms| ms.iter().find(|m| m.name == name))
            .cloned())
    }

    fn add_handler_mapping(&self, site: &str, mapping: &HandlerMapping) -> Result<()> {
        let mut state = self.lock();
        state
            .mappings
            .entry(site.to_string())
            .or_default()
            .push(mapping.clone());
        state
            .ops
            .push(format!("add-mapping {}/{}", site, mapping.name));
        Ok(())
    }

    fn set_default_documents(&self, site: &str, documents: &[String]) -> Result<()> {
        let mut state = self.lock();
        state
            .default_docs
            .insert(site.to_string(), documents.to_vec());
        state.ops.push(format!("set-default-documents {}", site));
        Ok(())
    }
}

//! Web-server configuration store.
//!
//! Narrow domain operations over the IIS configuration store: the global
//! FastCGI process registry, application pools, sites, site-scoped handler
//! mappings, and default documents. The production adapter shells out to
//! `appcmd.exe`; nothing above this layer knows how the store is reached.

use crate::error::{ProvisionError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// One HTTP binding: wildcard IP, fixed port, host header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteBinding {
    pub port: u16,
    pub host_header: String,
}

impl SiteBinding {
    /// The binding-information string the store uses, e.g. `*:8080:test.local`.
    pub fn information(&self) -> String {
        format!("*:{}:{}", self.port, self.host_header)
    }
}

/// Full definition of a website as the provisioner cares about it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteDefinition {
    pub name: String,
    pub physical_path: PathBuf,
    pub pool: String,
    pub binding: SiteBinding,
}

/// A file-extension-to-handler mapping at site scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerMapping {
    pub name: String,
    pub path: String,
    pub verbs: String,
    pub executable: PathBuf,
}

/// Pool properties the provisioner writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolSettings {
    /// Empty string means "no managed runtime".
    pub runtime_version: String,
    pub enable_32bit: bool,
}

/// Operations against the web server's configuration store.
pub trait WebServer {
    fn fastcgi_registered(&self, executable: &Path) -> Result<bool>;
    fn register_fastcgi(&self, executable: &Path, max_instances: u32) -> Result<()>;

    fn pool_exists(&self, name: &str) -> Result<bool>;
    fn create_pool(&self, name: &str) -> Result<()>;
    fn pool_running(&self, name: &str) -> Result<bool>;
    fn stop_pool(&self, name: &str) -> Result<()>;
    fn start_pool(&self, name: &str) -> Result<()>;
    fn configure_pool(&self, name: &str, settings: &PoolSettings) -> Result<()>;

    /// Read back the definition of an existing site, or `None`.
    fn site_definition(&self, name: &str) -> Result<Option<SiteDefinition>>;
    fn create_site(&self, definition: &SiteDefinition) -> Result<()>;
    fn delete_site(&self, name: &str) -> Result<()>;
    fn site_started(&self, name: &str) -> Result<bool>;
    fn start_site(&self, name: &str) -> Result<()>;

    fn handler_mapping(&self, site: &str, name: &str) -> Result<Option<HandlerMapping>>;
    fn add_handler_mapping(&self, site: &str, mapping: &HandlerMapping) -> Result<()>;

    /// Enable the default-document feature at site scope and replace the
    /// whole ordered candidate list.
    fn set_default_documents(&self, site: &str, documents: &[String]) -> Result<()>;
}

/// `appcmd.exe`-backed store access.
pub struct AppCmd {
    exe: PathBuf,
    /// Pause after stopping a pool before configuration writes; worker
    /// processes take a moment to wind down.
    settle: Duration,
}

impl AppCmd {
    pub fn new() -> Self {
        let windir = std::env::var("WINDIR").unwrap_or_else(|_| r"C:\Windows".to_string());
        AppCmd {
            exe: Path::new(&windir).join(r"System32\inetsrv\appcmd.exe"),
            settle: Duration::from_secs(1),
        }
    }

    fn appcmd(&self, target: &str, args: &[&str]) -> Result<String> {
        let exe = self.exe.to_string_lossy();
        let (code, output) = super::run_capture(&exe, args)?;
        if code != 0 {
            return Err(ProvisionError::ConfigWriteFailed {
                target: target.to_string(),
                message: format!(
                    "appcmd exited with code {}: {}",
                    code,
                    output.lines().last().unwrap_or("").trim()
                ),
            });
        }
        Ok(output)
    }

    fn text_query(&self, target: &str, args: &[&str]) -> Result<String> {
        Ok(self.appcmd(target, args)?.trim().to_string())
    }
}

impl Default for AppCmd {
    fn default() -> Self {
        Self::new()
    }
}

impl WebServer for AppCmd {
    fn fastcgi_registered(&self, executable: &Path) -> Result<bool> {
        let output = self.appcmd(
            "fastCgi registry",
            &["list", "config", "-section:system.webServer/fastCgi"],
        )?;
        let needle = format!("fullPath=\"{}\"", executable.display());
        Ok(output.contains(&needle))
    }

    fn register_fastcgi(&self, executable: &Path, max_instances: u32) -> Result<()> {
        let entry = format!(
            "/+\"[fullPath='{}',arguments='',maxInstances='{}']\"",
            executable.display(),
            max_instances
        );
        self.appcmd(
            "fastCgi registry",
            &[
                "set",
                "config",
                "-section:system.webServer/fastCgi",
                &entry,
                "/commit:apphost",
            ],
        )?;
        Ok(())
    }

    fn pool_exists(&self, name: &str) -> Result<bool> {
        let output = self.text_query(name, &["list", "apppool", name])?;
        Ok(!output.is_empty())
    }

    fn create_pool(&self, name: &str) -> Result<()> {
        self.appcmd(name, &["add", "apppool", &format!("/name:{}", name)])?;
        Ok(())
    }

    fn pool_running(&self, name: &str) -> Result<bool> {
        let state = self.text_query(name, &["list", "apppool", name, "/text:state"])?;
        Ok(state.eq_ignore_ascii_case("Started"))
    }

    fn stop_pool(&self, name: &str) -> Result<()> {
        self.appcmd(name, &["stop", "apppool", name])?;
        std::thread::sleep(self.settle);
        Ok(())
    }

    fn start_pool(&self, name: &str) -> Result<()> {
        self.appcmd(name, &["start", "apppool", name])?;
        Ok(())
    }

    fn configure_pool(&self, name: &str, settings: &PoolSettings) -> Result<()> {
        self.appcmd(
            name,
            &[
                "set",
                "apppool",
                name,
                &format!("/managedRuntimeVersion:{}", settings.runtime_version),
                &format!("/enable32BitAppOnWin64:{}", settings.enable_32bit),
            ],
        )?;
        Ok(())
    }

    fn site_definition(&self, name: &str) -> Result<Option<SiteDefinition>> {
        let listed = self.text_query(name, &["list", "site", name])?;
        if listed.is_empty() {
            return Ok(None);
        }

        let root = format!("{}/", name);
        let physical_path =
            self.text_query(name, &["list", "vdir", &root, "/text:physicalPath"])?;
        let pool = self.text_query(name, &["list", "app", &root, "/text:applicationPool"])?;
        let bindings = self.text_query(name, &["list", "site", name, "/text:bindings"])?;

        // e.g. "http/*:8080:test.local"
        let re = Regex::new(r"http/\*:(\d+):([^,\s]*)").expect("static regex");
        let binding = re
            .captures(&bindings)
            .map(|c| SiteBinding {
                port: c[1].parse().unwrap_or(0),
                host_header: c[2].to_string(),
            })
            .unwrap_or(SiteBinding {
                port: 0,
                host_header: String::new(),
            });

        Ok(Some(SiteDefinition {
            name: name.to_string(),
            physical_path: PathBuf::from(physical_path),
            pool,
            binding,
        }))
    }

    fn create_site(&self, definition: &SiteDefinition) -> Result<()> {
        self.appcmd(
            &definition.name,
            &[
                "add",
                "site",
                &format!("/name:{}", definition.name),
                &format!("/physicalPath:{}", definition.physical_path.display()),
                &format!("/bindings:http/{}", definition.binding.information()),
            ],
        )?;
        // The root application is created with the site; point it at the pool.
        self.appcmd(
            &definition.name,
            &[
                "set",
                "app",
                &format!("{}/", definition.name),
                &format!("/applicationPool:{}", definition.pool),
            ],
        )?;
        Ok(())
    }

    fn delete_site(&self, name: &str) -> Result<()> {
        self.appcmd(name, &["delete", "site", name])?;
        Ok(())
    }

    fn site_started(&self, name: &str) -> Result<bool> {
        let state = self.text_query(name, &["list", "site", name, "/text:state"])?;
        Ok(state.eq_ignore_ascii_case("Started"))
    }

    fn start_site(&self, name: &str) -> Result<()> {
        self.appcmd(name, &["start", "site", name])?;
        Ok(())
    }

    fn handler_mapping(&self, site: &str, name: &str) -> Result<Option<HandlerMapping>> {
        let output = self.appcmd(
            site,
            &[
                "list",
                "config",
                site,
                "-section:system.webServer/handlers",
            ],
        )?;

        let re = Regex::new(
            r#"(?s)<add name="([^"]+)" path="([^"]+)" verb="([^"]+)"[^>]*scriptProcessor="([^"]+)""#,
        )
        .expect("static regex");

        for captures in re.captures_iter(&output) {
            if &captures[1] == name {
                return Ok(Some(HandlerMapping {
                    name: captures[1].to_string(),
                    path: captures[2].to_string(),
                    verbs: captures[3].to_string(),
                    executable: PathBuf::from(&captures[4]),
                }));
            }
        }
        Ok(None)
    }

    fn add_handler_mapping(&self, site: &str, mapping: &HandlerMapping) -> Result<()> {
        let entry = format!(
            "/+\"[name='{}',path='{}',verb='{}',modules='FastCgiModule',scriptProcessor='{}',resourceType='Either']\"",
            mapping.name,
            mapping.path,
            mapping.verbs,
            mapping.executable.display()
        );
        self.appcmd(
            site,
            &[
                "set",
                "config",
                site,
                "-section:system.webServer/handlers",
                &entry,
            ],
        )?;
        Ok(())
    }

    fn set_default_documents(&self, site: &str, documents: &[String]) -> Result<()> {
        let section = "-section:system.webServer/defaultDocument";

        // Full replace: clear the collection, re-enable, add in order.
        self.appcmd(site, &["clear", "config", site, section])?;
        self.appcmd(site, &["set", "config", site, section, "/enabled:true"])?;
        for document in documents {
            let add = format!("/+files.[value='{}']", document);
            self.appcmd(site, &["set", "config", site, section, &add])?;
        }
        Ok(())
    }
}

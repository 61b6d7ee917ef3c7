//! Router discovery.
//!
//! The API directory holds one subdirectory per endpoint group. Each
//! subdirectory name is resolved against a compile-time registry of router
//! constructors (see [`crate::api::ENDPOINTS`]); matches are merged into a
//! [`RouterTable`], misses are logged and skipped.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use axum::Router;
use tracing::{debug, info, warn};

use crate::state::AppState;

/// Directory names that never hold an endpoint group and are skipped
/// without a warning.
pub const RESERVED_DIRS: [&str; 2] = ["__pycache__", "__init__"];

pub type RouterFn = fn() -> Router<AppState>;

/// Registry entry for one endpoint group.
#[derive(Debug, Clone, Copy)]
pub struct EndpointModule {
    pub name: &'static str,
    pub router: Option<RouterFn>,
}

impl EndpointModule {
    pub const fn new(name: &'static str, router: RouterFn) -> Self {
        Self {
            name,
            router: Some(router),
        }
    }

    /// A group that exists but exposes no router yet.
    #[cfg(test)]
    pub const fn without_router(name: &'static str) -> Self {
        Self { name, router: None }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Resolution {
    Router(RouterFn),
    NoRouter,
    NotFound,
}

/// Maps an endpoint-group directory name to its router module.
pub trait ModuleResolver {
    fn resolve(&self, name: &str) -> Resolution;
}

impl ModuleResolver for [EndpointModule] {
    fn resolve(&self, name: &str) -> Resolution {
        match self.iter().find(|m| m.name == name) {
            Some(EndpointModule {
                router: Some(router),
                ..
            }) => Resolution::Router(*router),
            Some(_) => Resolution::NoRouter,
            None => Resolution::NotFound,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    #[error("cannot read api directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// What happened to each subdirectory, by module path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub mounted: Vec<String>,
    pub missing: Vec<String>,
    pub without_router: Vec<String>,
    pub duplicates: Vec<String>,
    /// Reserved directory names, not module paths.
    pub reserved: Vec<String>,
}

/// Dispatch table under construction. A module path is mounted at most once.
pub struct RouterTable {
    router: Router<AppState>,
    mounted: BTreeSet<String>,
}

impl Default for RouterTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouterTable {
    pub fn new() -> Self {
        Self {
            router: Router::new(),
            mounted: BTreeSet::new(),
        }
    }

    /// Returns `false` and leaves the table unchanged if `module` is
    /// already mounted.
    pub fn mount(&mut self, module: &str, make: RouterFn) -> bool {
        if !self.mounted.insert(module.to_string()) {
            return false;
        }
        let router = std::mem::take(&mut self.router);
        self.router = router.merge(make());
        true
    }

    #[cfg(test)]
    pub fn is_mounted(&self, module: &str) -> bool {
        self.mounted.contains(module)
    }

    pub fn len(&self) -> usize {
        self.mounted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mounted.is_empty()
    }

    pub fn into_router(self) -> Router<AppState> {
        self.router
    }
}

pub fn module_path(package: &str, name: &str) -> String {
    format!("{package}.{name}.router")
}

/// Immediate subdirectory names of `api_dir`, sorted.
pub fn endpoint_dirs(api_dir: &Path) -> Result<Vec<String>, DiscoveryError> {
    let read_err = |source| DiscoveryError::ReadDir {
        path: api_dir.to_path_buf(),
        source,
    };
    let mut names = Vec::new();
    for entry in std::fs::read_dir(api_dir).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        match entry.file_name().into_string() {
            Ok(name) => names.push(name),
            Err(raw) => warn!(name = ?raw, "skipping non utf-8 directory name"),
        }
    }
    names.sort();
    Ok(names)
}

/// Why a group directory has no registry entry, as shown in the warning.
fn missing_reason(group_dir: &Path) -> &'static str {
    if group_dir.join("router.rs").is_file() {
        "router.rs exists but the group is not registered"
    } else {
        "router.rs is missing"
    }
}

/// Scan `api_dir` and mount every resolvable router into `table`.
pub fn discover_routers<R>(
    api_dir: &Path,
    package: &str,
    resolver: &R,
    table: &mut RouterTable,
) -> Result<DiscoveryReport, DiscoveryError>
where
    R: ModuleResolver + ?Sized,
{
    let mut report = DiscoveryReport::default();
    for name in endpoint_dirs(api_dir)? {
        if RESERVED_DIRS.contains(&name.as_str()) {
            report.reserved.push(name);
            continue;
        }
        let module = module_path(package, &name);
        match resolver.resolve(&name) {
            Resolution::Router(make) => {
                if table.mount(&module, make) {
                    info!("router added: {module}");
                    report.mounted.push(module);
                } else {
                    debug!(%module, "router already mounted");
                    report.duplicates.push(module);
                }
            }
            Resolution::NoRouter => {
                warn!("{module} has no router");
                report.without_router.push(module);
            }
            Resolution::NotFound => {
                let reason = missing_reason(&api_dir.join(&name));
                warn!("{module} not found ({reason})");
                report.missing.push(module);
            }
        }
    }
    Ok(report)
}

//! Scriptpack API - Bundling orchestration layer
//!
//! Provides a unified bundling interface, including:
//! - Request handling on top of `scriptpack_core::Bundler`
//! - Configuration abstraction (BundleConfig)
//! - Unified error handling (ApiError)
//!
//! For CLI convenience, this crate provides a global singleton API.
//! For library use, prefer the explicit `bundle(request, &config)` API.

use std::path::Path;

use scriptpack_core::{Bundler, ModuleSet};
use scriptpack_vfs::{NativeFileSystem, VirtualFileSystem};
use tracing::{debug, info};

// Re-export config
pub mod config;
pub use config::{config as get_config, init as init_config, is_initialized, BundleConfig};

// Re-export config types from scriptpack_config
pub use scriptpack_config::{Convention, LogLevel, LoggingConfig, Phase, ScriptpackConfig};

// Re-export error and types
pub mod error;
pub mod types;
pub use error::{ApiError, ErrorReport};
pub use types::{BundleOutput, OrderEntry};

pub use scriptpack_config;
pub use scriptpack_core;

const TARGET: &str = "scriptpack::api";

/// Load a `scriptpack.json` project file
pub fn load_project(path: &Path) -> Result<ScriptpackConfig, ApiError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApiError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    ScriptpackConfig::from_json_str(&content).map_err(|e| ApiError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

/// Build a bundler reading from the native file system
pub fn bundler(config: &BundleConfig) -> Bundler {
    bundler_with_vfs(Box::new(NativeFileSystem::new()), config)
}

/// Build a bundler over any file system
pub fn bundler_with_vfs(vfs: Box<dyn VirtualFileSystem>, config: &BundleConfig) -> Bundler {
    Bundler::new(vfs, &config.root, config.convention.clone())
}

/// Bundle with explicit configuration
///
/// This is the recommended API for library users.
pub fn bundle(request: &str, config: &BundleConfig) -> Result<BundleOutput, ApiError> {
    bundle_with(&bundler(config), request)
}

/// Bundle a request with an existing bundler
pub fn bundle_with(bundler: &Bundler, request: &str) -> Result<BundleOutput, ApiError> {
    info!(target: TARGET, request, "Starting bundle");
    let output = BundleOutput::from(bundler.bundle_path(request)?);
    info!(target: TARGET, modules = output.order.len(), "Bundle completed");
    Ok(output)
}

/// Resolve and order the modules of a request without emitting
pub fn resolve_with(bundler: &Bundler, request: &str) -> Result<ModuleSet, ApiError> {
    let parsed = bundler.request(request)?;
    let set = bundler.resolve(&parsed)?;
    debug!(target: TARGET, request, modules = set.len(), "Request resolved");
    Ok(set)
}

/// Module order of a request
pub fn order_with(bundler: &Bundler, request: &str) -> Result<Vec<OrderEntry>, ApiError> {
    let set = resolve_with(bundler, request)?;
    Ok(set.ordered().map(OrderEntry::from).collect())
}

/// Graphviz DOT rendering of a request's dependency graph
pub fn graph_with(bundler: &Bundler, request: &str) -> Result<String, ApiError> {
    Ok(resolve_with(bundler, request)?.to_dot())
}

// ==================== Global config API ====================

/// Bundle a request (uses global config)
pub fn bundle_request(request: &str) -> Result<BundleOutput, ApiError> {
    bundle(request, get_config()?)
}

/// Module order of a request (uses global config)
pub fn order_request(request: &str) -> Result<Vec<OrderEntry>, ApiError> {
    order_with(&bundler(get_config()?), request)
}

/// Dependency graph of a request (uses global config)
pub fn graph_request(request: &str) -> Result<String, ApiError> {
    graph_with(&bundler(get_config()?), request)
}

/// Bundle with default config rooted at `root` (auto-initializes if needed)
///
/// An already initialized global config wins over `root`.
pub fn quick_bundle(root: impl AsRef<Path>, request: &str) -> Result<BundleOutput, ApiError> {
    match init_config(BundleConfig::new(root.as_ref())) {
        Ok(()) | Err(ApiError::ConfigAlreadyInitialized) => {}
        Err(e) => return Err(e),
    }
    bundle_request(request)
}

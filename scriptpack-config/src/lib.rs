//! Scriptpack Config - Pure configuration data structures
//!
//! This crate contains only data structures, no logic or global state.
//! It serves as the shared configuration vocabulary across all scriptpack crates.

use serde::Deserialize;
use std::path::PathBuf;

/// Naming and source conventions understood by the resolver
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Convention {
    /// Module file extension, without the dot
    pub extension: String,
    /// Name of the default category (the request directory itself)
    pub default_category: String,
    /// Alias accepted for the default category in dependency specs
    pub default_category_alias: String,
    /// Mask meaning "every module of the category"
    pub wildcard: String,
    /// Last wrapper parameter marking a self-registering module
    pub marker_param: String,
    /// Setup method declaring compile dependencies
    pub compile_method: String,
    /// Setup method declaring launch dependencies
    pub launch_method: String,
    /// Setup method declaring optional dependencies
    pub optional_method: String,
    /// Loader script prepended to bundles holding self-registering modules
    pub loader_file: String,
    /// Global variable the loader script defines
    pub loader_var: String,
    /// Loader function called by the bundle trailer
    pub loader_entry: String,
}

impl Default for Convention {
    fn default() -> Self {
        Self {
            extension: "js".to_string(),
            default_category: ".".to_string(),
            default_category_alias: "_".to_string(),
            wildcard: "*".to_string(),
            marker_param: "Script".to_string(),
            compile_method: "setCompileDependencies".to_string(),
            launch_method: "setLaunchDependencies".to_string(),
            optional_method: "setOptionalDependencies".to_string(),
            loader_file: "Loader.js".to_string(),
            loader_var: "_jsUtilsLoader".to_string(),
            loader_entry: "exec".to_string(),
        }
    }
}

impl Convention {
    /// Map the default-category alias onto the default category
    pub fn canonical_category<'a>(&'a self, category: &'a str) -> &'a str {
        if category == self.default_category_alias {
            &self.default_category
        } else {
            category
        }
    }
}

/// Log level
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Parse a level name; `silent` maps to `Error`
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "silent" | "error" => Some(LogLevel::Error),
            "warn" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Bundling phase, used for phase-specific log filtering
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Discovery,
    Graph,
    Weight,
    Emit,
}

impl Phase {
    /// All phases in pipeline order
    pub const ALL: [Phase; 4] = [Phase::Discovery, Phase::Graph, Phase::Weight, Phase::Emit];

    /// Get the string name of the phase
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Discovery => "discovery",
            Phase::Graph => "graph",
            Phase::Weight => "weight",
            Phase::Emit => "emit",
        }
    }

    /// Get the log target name for this phase
    pub fn target(&self) -> String {
        format!("scriptpack::{}", self.as_str())
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Global level
    pub level: LogLevel,
    pub discovery: Option<LogLevel>,
    pub graph: Option<LogLevel>,
    pub weight: Option<LogLevel>,
    pub emit: Option<LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Warn,
            discovery: None,
            graph: None,
            weight: None,
            emit: None,
        }
    }
}

/// Project file contents (`scriptpack.json`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ScriptpackConfig {
    /// Directory request paths are resolved against
    pub root: Option<PathBuf>,
    pub convention: Convention,
    pub logging: LoggingConfig,
}

impl ScriptpackConfig {
    /// Parse a project file
    pub fn from_json_str(content: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_convention() {
        let cfg = Convention::default();
        assert_eq!(cfg.extension, "js");
        assert_eq!(cfg.marker_param, "Script");
        assert_eq!(cfg.canonical_category("_"), ".");
        assert_eq!(cfg.canonical_category("lib"), "lib");
    }

    #[test]
    fn test_phase_as_str() {
        assert_eq!(Phase::Discovery.as_str(), "discovery");
        assert_eq!(Phase::Emit.target(), "scriptpack::emit");
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!(LogLevel::parse("silent"), Some(LogLevel::Error));
        assert_eq!(LogLevel::parse("DEBUG"), Some(LogLevel::Debug));
        assert_eq!(LogLevel::parse("loud"), None);
    }

    #[test]
    fn test_project_file_partial_override() {
        let cfg = ScriptpackConfig::from_json_str(
            r#"{
                "root": "/srv/utils",
                "convention": { "loader_var": "_loader", "extension": "mjs" },
                "logging": { "level": "debug", "weight": "trace" }
            }"#,
        )
        .unwrap();

        assert_eq!(cfg.root, Some(PathBuf::from("/srv/utils")));
        assert_eq!(cfg.convention.loader_var, "_loader");
        assert_eq!(cfg.convention.extension, "mjs");
        assert_eq!(cfg.convention.marker_param, "Script");
        assert_eq!(cfg.logging.level, LogLevel::Debug);
        assert_eq!(cfg.logging.weight, Some(LogLevel::Trace));
        assert_eq!(cfg.logging.discovery, None);
    }

    #[test]
    fn test_empty_project_file() {
        assert_eq!(ScriptpackConfig::from_json_str("{}").unwrap(), ScriptpackConfig::default());
    }
}

//! Scriptpack CLI - Command line interface
//!
//! Bundles a request path against a project root. Settings come from an
//! optional `scriptpack.json`; command-line flags override it.

use clap::Parser;
use std::path::{Path, PathBuf};
use std::process;

mod config;
mod logging;
mod platform;

use crate::config::LogConfig;
use crate::logging::LogFormat;
use crate::platform::{format_order, print_error, write_output};
use scriptpack_api::{
    bundle_request, graph_request, init_config, load_project, order_request, ApiError,
    BundleConfig, LogLevel, ScriptpackConfig,
};

const DEFAULT_PROJECT_FILE: &str = "scriptpack.json";

#[derive(Parser)]
#[command(
    name = "scriptpack",
    about = "Resolve and bundle self-registering script modules",
    version
)]
struct Cli {
    /// Request path, e.g. `js/u:5.js`, `js/*.js` or `js/main.js`
    #[arg(value_name = "REQUEST")]
    request: String,

    /// Directory request paths are resolved against
    #[arg(long, value_name = "DIR")]
    root: Option<PathBuf>,

    /// Project file (default: ./scriptpack.json when present)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Write the result here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Print the dependency graph in Graphviz DOT format
    #[arg(long, conflicts_with = "order")]
    graph: bool,

    /// Print the module order instead of the bundle
    #[arg(long)]
    order: bool,

    /// Log level: silent, error, warn, info, debug, trace
    #[arg(long, value_name = "LEVEL", value_parser = parse_log_level)]
    log_level: Option<LogLevel>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

fn parse_log_level(s: &str) -> Result<LogLevel, String> {
    LogLevel::parse(s).ok_or_else(|| format!("unknown log level '{}'", s))
}

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.log_format == LogFormat::Json;

    let (project, project_dir) = match read_project(cli.config.as_deref()) {
        Ok(found) => found,
        Err(e) => {
            print_error(&e, json_errors);
            process::exit(1);
        }
    };

    logging::init(
        &LogConfig::from_logging(&project.logging, cli.log_level),
        cli.log_format,
    );

    let mut bundle_config = BundleConfig::from_project(&project, &project_dir);
    if let Some(root) = &cli.root {
        bundle_config.root = root.clone();
    }
    tracing::debug!(root = %bundle_config.root.display(), "Configuration loaded");

    if let Err(e) = init_config(bundle_config) {
        print_error(&e, json_errors);
        process::exit(1);
    }

    let result = run(&cli);
    match result {
        Ok(text) => {
            if let Err(e) = write_output(cli.output.as_deref(), &text) {
                eprintln!("error: cannot write output: {}", e);
                process::exit(1);
            }
        }
        Err(e) => {
            print_error(&e, json_errors);
            process::exit(1);
        }
    }
}

fn run(cli: &Cli) -> Result<String, ApiError> {
    if cli.graph {
        let mut dot = graph_request(&cli.request)?;
        dot.push('\n');
        Ok(dot)
    } else if cli.order {
        Ok(format_order(&order_request(&cli.request)?))
    } else {
        let output = bundle_request(&cli.request)?;
        tracing::info!(last_modified = %output.last_modified(), "Bundle ready");
        Ok(output.text)
    }
}

/// 读取项目文件：显式指定的必须存在，默认文件缺失时使用默认配置
fn read_project(explicit: Option<&Path>) -> Result<(ScriptpackConfig, PathBuf), ApiError> {
    let path = explicit.unwrap_or(Path::new(DEFAULT_PROJECT_FILE));
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    if explicit.is_none() && !path.exists() {
        return Ok((ScriptpackConfig::default(), dir));
    }
    Ok((load_project(path)?, dir))
}

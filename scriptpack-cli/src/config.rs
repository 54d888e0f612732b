//! CLI 配置
//!
//! 把项目文件里的日志配置和命令行参数合并成 tracing 的级别

use scriptpack_config::{LogLevel, LoggingConfig, Phase};
use tracing::Level;

/// CLI 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub discovery: Option<Level>,
    pub graph: Option<Level>,
    pub weight: Option<Level>,
    pub emit: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::WARN,
            discovery: None,
            graph: None,
            weight: None,
            emit: None,
        }
    }
}

fn to_level(level: LogLevel) -> Level {
    match level {
        LogLevel::Error => Level::ERROR,
        LogLevel::Warn => Level::WARN,
        LogLevel::Info => Level::INFO,
        LogLevel::Debug => Level::DEBUG,
        LogLevel::Trace => Level::TRACE,
    }
}

impl LogConfig {
    /// 命令行的 `--log-level` 覆盖项目文件中的全局级别，阶段级别保留
    pub fn from_logging(logging: &LoggingConfig, override_level: Option<LogLevel>) -> Self {
        Self {
            global: to_level(override_level.unwrap_or(logging.level)),
            discovery: logging.discovery.map(to_level),
            graph: logging.graph.map(to_level),
            weight: logging.weight.map(to_level),
            emit: logging.emit.map(to_level),
        }
    }

    /// Get log level for a specific phase
    pub fn level_for(&self, phase: Phase) -> Level {
        let specific = match phase {
            Phase::Discovery => self.discovery,
            Phase::Graph => self.graph,
            Phase::Weight => self.weight,
            Phase::Emit => self.emit,
        };
        specific.unwrap_or(self.global)
    }
}

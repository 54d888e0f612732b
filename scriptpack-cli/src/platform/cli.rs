//! CLI 格式化输出
//!
//! 提供命令行友好的错误显示和结果输出。

use scriptpack_api::{ApiError, OrderEntry};
use std::io::{self, Write};
use std::path::Path;

/// 打印错误到 stderr；`json` 时输出结构化报告
pub fn print_error(e: &ApiError, json: bool) {
    let report = e.to_report();
    if json {
        eprintln!("{}", report.to_json());
        return;
    }

    eprintln!("error: {}", report);
    for module in &report.modules {
        eprintln!("  - {}", module);
    }
    if let Some(path) = &report.path {
        eprintln!("  at {}", path);
    }
}

/// 每行一个模块：名称、版本、路径；诊断信息缩进列在模块下方
pub fn format_order(entries: &[OrderEntry]) -> String {
    let width = entries.iter().map(|e| e.name.len()).max().unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!(
            "{:<width$}  {}  {}\n",
            entry.name,
            entry.version,
            entry.path.display(),
            width = width
        ));
        for diagnostic in &entry.diagnostics {
            out.push_str(&format!("    warning: {}\n", diagnostic));
        }
    }
    out
}

/// 写到文件，没有指定文件时写到 stdout
pub fn write_output(path: Option<&Path>, text: &str) -> io::Result<()> {
    match path {
        Some(path) => std::fs::write(path, text),
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            handle.write_all(text.as_bytes())?;
            handle.flush()
        }
    }
}

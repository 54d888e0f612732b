//! 模块元数据提取
//!
//! 自注册模块以一个包装函数开头，其最后一个形参是加载器注入的标记参数：
//!
//! ```text
//! ((cat, id, varName, autoVersion, Script) => {
//!     const _ = new Script(id, autoVersion);
//!     _.setCompileDependencies({ u: 0 });
//!     _.setLaunchDependencies(['lib-2', 3]);
//! })();
//! ```
//!
//! 只有自注册模块的依赖声明会被读取。声明可以是调用 `name(literal)`，
//! 也可以是属性 `name: literal` 或赋值 `name = literal`。

use std::ops::Range;

use scriptpack_config::Convention;
use serde_json::Value;
use tracing::{debug, warn};

use crate::literal::{decode_prefix, scanner::is_identifier_continue};
use crate::module::Dependencies;
use crate::reference::{DependencyKind, DependencySpec, ModuleId};

const TARGET: &str = "scriptpack::discovery";

/// 从源码中提取的元数据
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleMetadata {
    pub is_self_registering: bool,
    /// 各类依赖，同类多次声明按源码顺序拼接
    pub dependencies: Dependencies<ModuleId>,
    /// 无法解码的字面量、无法识别的引用
    pub diagnostics: Vec<String>,
}

/// 提取模块元数据
pub fn extract(source: &str, convention: &Convention) -> ModuleMetadata {
    let mut metadata = ModuleMetadata {
        is_self_registering: is_self_registering(source, &convention.marker_param),
        ..Default::default()
    };
    if !metadata.is_self_registering {
        return metadata;
    }

    let comments = comment_spans(source);
    for kind in DependencyKind::ALL {
        let name = kind.method_name(convention);
        for literal_at in declarations(source, name, &comments) {
            match decode_declaration(&source[literal_at.start..], literal_at.is_call) {
                Ok(Some(value)) => {
                    collect_specs(&value, kind, convention, &mut metadata);
                }
                Ok(None) => {
                    debug!(target: TARGET, method = name, offset = literal_at.start, "Literal is not a call argument, skipped");
                }
                Err(err) => {
                    let message = format!(
                        "malformed {} literal at byte {}: {}",
                        name,
                        literal_at.start + err.offset,
                        err.kind
                    );
                    warn!(target: TARGET, "{}", message);
                    metadata.diagnostics.push(message);
                }
            }
        }
    }

    metadata
}

/// 去掉前导空白与注释后，文本以 `(` 开头，且第一个括号组至少有两个参数、
/// 最后一个参数为标记名
pub fn is_self_registering(source: &str, marker: &str) -> bool {
    let Some(rest) = skip_leading_trivia(source).strip_prefix('(') else {
        return false;
    };
    let Some(close) = rest.find(')') else {
        return false;
    };
    match rest[..close].rsplit_once(',') {
        Some((head, last)) => !head.is_empty() && last.trim() == marker,
        None => false,
    }
}

fn skip_leading_trivia(mut text: &str) -> &str {
    loop {
        text = text.trim_start();
        if let Some(rest) = text.strip_prefix("//") {
            text = rest.find('\n').map_or("", |end| &rest[end..]);
        } else if let Some(rest) = text.strip_prefix("/*") {
            match rest.find("*/") {
                Some(end) => text = &rest[end + 2..],
                None => return text,
            }
        } else {
            return text;
        }
    }
}

/// 注释所占的字节区间
///
/// 字符串按引号跳过（单双引号字符串在行尾结束），避免把 `"http://"` 当作注释。
fn comment_spans(source: &str) -> Vec<Range<usize>> {
    let bytes = source.as_bytes();
    let len = bytes.len();
    let mut spans = Vec::new();
    let mut i = 0;

    while i < len {
        match bytes[i] {
            quote @ (b'"' | b'\'' | b'`') => {
                i += 1;
                while i < len {
                    match bytes[i] {
                        b'\\' => i += 2,
                        c if c == quote => {
                            i += 1;
                            break;
                        }
                        b'\n' if quote != b'`' => break,
                        _ => i += 1,
                    }
                }
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                let start = i;
                while i < len && bytes[i] != b'\n' {
                    i += 1;
                }
                spans.push(start..i);
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                let start = i;
                i = source[i + 2..].find("*/").map_or(len, |end| i + 2 + end + 2);
                spans.push(start..i);
            }
            _ => i += 1,
        }
    }

    spans
}

struct Declaration {
    start: usize,
    is_call: bool,
}

/// 找出方法名之后紧跟字面量的所有声明位置
fn declarations(source: &str, name: &str, comments: &[Range<usize>]) -> Vec<Declaration> {
    let mut found = Vec::new();

    for (at, _) in source.match_indices(name) {
        if comments.iter().any(|span| span.contains(&at)) {
            continue;
        }

        let before = source[..at].chars().next_back();
        let mut pos = at + name.len();
        let mut rest = &source[pos..];

        match before {
            Some(c) if is_identifier_continue(c) => continue,
            // 引号包裹的键，如 `"setLaunchDependencies": [...]` 或 `['setLaunchDependencies'] = ...`
            Some(quote @ ('"' | '\'')) => {
                let Some(after) = rest.strip_prefix(quote) else {
                    continue;
                };
                rest = after;
                pos += 1;
                let bracketed = source[..at - 1].ends_with('[');
                if bracketed {
                    let Some(after) = rest.strip_prefix(']') else {
                        continue;
                    };
                    rest = after;
                    pos += 1;
                }
            }
            _ => {}
        }
        if rest.chars().next().is_some_and(is_identifier_continue) {
            continue;
        }

        let trimmed = rest.trim_start();
        pos += rest.len() - trimmed.len();
        let is_call = match trimmed.chars().next() {
            Some('(') => true,
            Some(':') => false,
            Some('=') if !matches!(trimmed[1..].chars().next(), Some('=' | '>')) => false,
            _ => continue,
        };
        pos += 1;

        let value = source[pos..].trim_start();
        pos = source.len() - value.len();
        if value.starts_with(&['{', '[', '"', '\''][..]) {
            found.push(Declaration { start: pos, is_call });
        }
    }

    found
}

/// 解码声明中的字面量；调用形式要求字面量后紧跟 `)`
fn decode_declaration(
    text: &str,
    is_call: bool,
) -> Result<Option<Value>, crate::literal::LiteralError> {
    let (value, end) = decode_prefix(text)?;
    if is_call && !text[end..].trim_start().starts_with(')') {
        return Ok(None);
    }
    Ok(Some(value))
}

/// 展开对象的值与数组元素，逐个解析为依赖引用
fn collect_specs(
    value: &Value,
    kind: DependencyKind,
    convention: &Convention,
    metadata: &mut ModuleMetadata,
) {
    match value {
        Value::Object(map) => {
            for item in map.values() {
                collect_specs(item, kind, convention, metadata);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_specs(item, kind, convention, metadata);
            }
        }
        scalar => match DependencySpec::from_value(scalar, convention) {
            Ok(spec) => {
                let kind = spec.kind.unwrap_or(kind);
                metadata.dependencies.get_mut(kind).push(spec.id);
            }
            Err(err) => {
                warn!(target: TARGET, error = %err, "Ignoring dependency reference");
                metadata.diagnostics.push(err.to_string());
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extract_default(source: &str) -> ModuleMetadata {
        extract(source, &Convention::default())
    }

    const WRAPPER: &str = "/**\n * Events (which need the DOM)\n */\n((cat, id, varName = document?.currentScript?.dataset?.var, autoVersion, Script) => {\n";

    #[test]
    fn test_self_registration_signature() {
        assert!(is_self_registering(&format!("{}}})();", WRAPPER), "Script"));
        assert!(is_self_registering("// a\n// b\n(function(win, Script) {})();", "Script"));
        assert!(is_self_registering("(a,Script)=>0", "Script"));

        assert!(!is_self_registering("(Script) => {}", "Script"));
        assert!(!is_self_registering("(a, Scripts) => {}", "Script"));
        assert!(!is_self_registering("const x = (a, Script) => {}", "Script"));
        assert!(!is_self_registering("/* never closed (a, Script)", "Script"));
    }

    #[test]
    fn test_non_self_registering_declarations_are_ignored() {
        let metadata = extract_default("var _ = {}; _.setCompileDependencies([1]);");
        assert!(!metadata.is_self_registering);
        assert!(metadata.dependencies.is_empty());
    }

    #[test]
    fn test_declaration_forms() {
        let source = format!(
            "{}\t_.setCompileDependencies({{ u: 0, dom: 'lib-1' }});\n\
             \t_.setLaunchDependencies( [\"2\", 3] );\n\
             \tconst opts = {{ setOptionalDependencies: ['ui/4'] }};\n\
             \t_.setLaunchDependencies({{ net: [5, 6] }});\n}})();",
            WRAPPER
        );
        let metadata = extract_default(&source);

        assert!(metadata.is_self_registering);
        // 对象按键名顺序展开
        assert_eq!(
            metadata.dependencies.compile,
            vec![ModuleId::new("lib", 1), ModuleId::new(".", 0)]
        );
        assert_eq!(
            metadata.dependencies.launch,
            vec![
                ModuleId::new(".", 2),
                ModuleId::new(".", 3),
                ModuleId::new(".", 5),
                ModuleId::new(".", 6),
            ]
        );
        assert_eq!(metadata.dependencies.optional, vec![ModuleId::new("ui", 4)]);
        assert!(metadata.diagnostics.is_empty());
    }

    #[test]
    fn test_method_definitions_are_not_declarations() {
        let source = format!(
            "{}\tconst _ = Script ? new Script(id) : {{\n\
             \t\tsetLaunchDependencies(deps) {{ Object.keys(deps); }},\n\
             \t}};\n\
             \tScript.prototype.setOptionalDependencies = Script.prototype.setLaunchDependencies;\n\
             \tif (x.setCompileDependencies == ['a']) {{}}\n}})();",
            WRAPPER
        );
        let metadata = extract_default(&source);
        assert!(metadata.dependencies.is_empty());
        assert!(metadata.diagnostics.is_empty());
    }

    #[test]
    fn test_kind_prefix_overrides_method() {
        let source = format!("{}_.setLaunchDependencies(['optional:7', 8]);}})();", WRAPPER);
        let metadata = extract_default(&source);
        assert_eq!(metadata.dependencies.launch, vec![ModuleId::new(".", 8)]);
        assert_eq!(metadata.dependencies.optional, vec![ModuleId::new(".", 7)]);
    }

    #[test]
    fn test_unknown_kind_prefix_becomes_diagnostic() {
        let source = format!("{}_.setCompileDependencies(['lib:3', 4]);}})();", WRAPPER);
        let metadata = extract_default(&source);
        assert_eq!(metadata.dependencies.compile, vec![ModuleId::new(".", 4)]);
        assert_eq!(metadata.diagnostics.len(), 1);
        assert!(metadata.diagnostics[0].contains("unknown kind prefix 'lib'"));
    }

    #[test]
    fn test_commented_declarations_are_skipped() {
        let source = format!(
            "{}// _.setCompileDependencies([1]);\n\
             /* _.setCompileDependencies([2]); */\n\
             const url = 'http://host'; _.setCompileDependencies([3]);}})();",
            WRAPPER
        );
        let metadata = extract_default(&source);
        assert_eq!(metadata.dependencies.compile, vec![ModuleId::new(".", 3)]);
    }

    #[test]
    fn test_quoted_key_declaration() {
        let source = format!("{}const d = {{ \"setLaunchDependencies\": [\"lib-9\"] }};}})();", WRAPPER);
        let metadata = extract_default(&source);
        assert_eq!(metadata.dependencies.launch, vec![ModuleId::new("lib", 9)]);
    }

    #[test]
    fn test_malformed_literal_is_lenient() {
        let source = format!(
            "{}_.setCompileDependencies({{ u: 0 ]);\n_.setLaunchDependencies([1, 'nope', true]);}})();",
            WRAPPER
        );
        let metadata = extract_default(&source);
        assert!(metadata.dependencies.compile.is_empty());
        assert_eq!(metadata.dependencies.launch, vec![ModuleId::new(".", 1)]);
        assert_eq!(metadata.diagnostics.len(), 3);
        assert!(metadata.diagnostics[0].starts_with("malformed setCompileDependencies literal"));
    }

    #[test]
    fn test_custom_convention() {
        let convention = Convention {
            marker_param: "Loader".into(),
            launch_method: "needs".into(),
            ..Default::default()
        };
        let metadata = extract("((id, Loader) => { L.needs(['x-1']); })();", &convention);
        assert!(metadata.is_self_registering);
        assert_eq!(metadata.dependencies.launch, vec![ModuleId::new("x", 1)]);
    }
}

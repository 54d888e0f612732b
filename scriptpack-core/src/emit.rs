//! 打包输出
//!
//! 向每个自注册模块的包装调用注入五个引导参数，按顺序拼接，
//! 需要时在前面加上加载器脚本、在末尾追加启动调用。

use std::path::PathBuf;
use std::time::SystemTime;

use scriptpack_config::Convention;
use scriptpack_vfs::VirtualFileSystem;
use tracing::{debug, info, instrument, warn};

use crate::error::{BundleError, BundleResult};
use crate::module::{Module, ModuleKey, ModuleSet};

const TARGET: &str = "scriptpack::emit";

/// 最终产物
#[derive(Debug, Clone)]
pub struct Bundle {
    pub text: String,
    /// 所有参与文件（含加载器）中最新的修改时间
    pub newest_mtime: SystemTime,
    /// 输出顺序下的模块键，不含加载器
    pub order: Vec<ModuleKey>,
    /// 被前置的加载器脚本
    pub loader: Option<PathBuf>,
}

/// 在最后一个 `();` 的括号内插入参数；没有包装调用时返回 `None`
pub fn inject_args(source: &str, args: &str) -> Option<String> {
    let at = source.rfind("();")? + 1;
    let mut out = String::with_capacity(source.len() + args.len());
    out.push_str(&source[..at]);
    out.push_str(args);
    out.push_str(&source[at..]);
    Some(out)
}

/// JS 字符串字面量（带引号并转义）
fn js_string(text: &str) -> String {
    serde_json::Value::from(text).to_string()
}

/// 模块的引导参数：分类、编号、空变量名、版本、加载器句柄
pub fn module_args(module: &Module, convention: &Convention) -> String {
    let sub_id = module
        .sub_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "undefined".to_string());
    format!(
        "{}, {}, \"\", {}, {}.{}",
        js_string(&module.category),
        sub_id,
        js_string(&module.version),
        convention.loader_var,
        convention.marker_param
    )
}

/// 加载器脚本的参数：请求中的逻辑名或 `undefined`
pub fn loader_args(name: Option<&str>) -> String {
    match name {
        Some(name) => js_string(name),
        None => "undefined".to_string(),
    }
}

/// 打包输出器
pub struct BundleEmitter<'a> {
    vfs: &'a dyn VirtualFileSystem,
    convention: &'a Convention,
}

impl<'a> BundleEmitter<'a> {
    pub fn new(vfs: &'a dyn VirtualFileSystem, convention: &'a Convention) -> Self {
        Self { vfs, convention }
    }

    /// 按 `set.order` 拼接模块
    #[instrument(target = "scriptpack::emit", level = "debug", skip_all, fields(modules = set.len()))]
    pub fn emit(&self, set: &ModuleSet) -> BundleResult<Bundle> {
        let has_self_registering = set.has_self_registering();
        let mut text = String::new();
        let mut newest_mtime = SystemTime::UNIX_EPOCH;
        let mut loader = None;

        if has_self_registering {
            if let Some((path, source, mtime)) = self.read_loader(set)? {
                let args = loader_args(set.name.as_deref());
                let source = inject_args(&source, &args).unwrap_or_else(|| {
                    debug!(target: TARGET, path = %path.display(), "Loader has no wrapper call");
                    source.clone()
                });
                text.push('\n');
                text.push_str(&source);
                newest_mtime = newest_mtime.max(mtime);
                loader = Some(path);
            }
        }

        for module in set.ordered() {
            text.push('\n');
            if module.is_self_registering {
                match inject_args(&module.source, &module_args(module, self.convention)) {
                    Some(source) => text.push_str(&source),
                    None => {
                        warn!(target: TARGET, module = %module.key, "Self-registering module has no wrapper call");
                        text.push_str(&module.source);
                    }
                }
            } else {
                text.push_str(&module.source);
            }
            newest_mtime = newest_mtime.max(module.mtime);
        }

        if has_self_registering {
            text.push('\n');
            text.push_str(&format!(
                "{}.{}();",
                self.convention.loader_var, self.convention.loader_entry
            ));
        }

        info!(target: TARGET, modules = set.len(), bytes = text.len(), "Bundle emitted");
        Ok(Bundle {
            text,
            newest_mtime,
            order: set.ordered_keys(),
            loader,
        })
    }

    fn read_loader(&self, set: &ModuleSet) -> BundleResult<Option<(PathBuf, String, SystemTime)>> {
        let path = set.dir.join(&self.convention.loader_file);
        let bytes = match self.vfs.read_file(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.is_not_found() => {
                warn!(target: TARGET, path = %path.display(), "Loader script not found, bundle has no prelude");
                return Ok(None);
            }
            Err(source) => return Err(BundleError::Io { path, source }),
        };
        let mtime = match self.vfs.modified(&path) {
            Ok(mtime) => mtime,
            Err(source) => return Err(BundleError::Io { path, source }),
        };
        match String::from_utf8(bytes) {
            Ok(source) => Ok(Some((path, source, mtime))),
            Err(_) => Err(BundleError::Encoding { path }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::BitMask;
    use crate::module::Dependencies;
    use crate::reference::ModuleId;
    use scriptpack_vfs::MemoryFileSystem;
    use std::path::Path;
    use std::time::Duration;

    fn module(sub_id: u32, source: &str, self_registering: bool, secs: u64) -> Module {
        Module {
            key: ModuleKey::Numbered(ModuleId::new(".", sub_id)),
            path: PathBuf::new(),
            category: ".".into(),
            sub_id: Some(sub_id),
            source: source.to_string(),
            mtime: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
            version: format!("v{}", sub_id),
            is_self_registering: self_registering,
            declared: Dependencies::default(),
            dependencies: Dependencies::default(),
            power_id: BitMask::new(),
            weight: BitMask::new(),
            compile_weight: BitMask::new(),
            diagnostics: Vec::new(),
        }
    }

    fn set(modules: Vec<Module>, order: Vec<usize>, name: Option<&str>) -> ModuleSet {
        ModuleSet {
            modules,
            order,
            dir: PathBuf::from("/js"),
            name: name.map(str::to_string),
        }
    }

    #[test]
    fn test_inject_args_uses_last_call() {
        let source = "((a, Script) => { f(); })();\n// end";
        let out = inject_args(source, "1, 2").unwrap();
        assert_eq!(out, "((a, Script) => { f(); })(1, 2);\n// end");
        assert_eq!(inject_args("no call", "x"), None);
    }

    #[test]
    fn test_module_args() {
        let convention = Convention::default();
        let mut m = module(3, "", true, 0);
        m.version = "20240101.000000".into();
        assert_eq!(
            module_args(&m, &convention),
            r#"".", 3, "", "20240101.000000", _jsUtilsLoader.Script"#
        );
        m.sub_id = None;
        assert!(module_args(&m, &convention).starts_with(r#"".", undefined, """#));
    }

    #[test]
    fn test_names_are_escaped() {
        let convention = Convention::default();
        let mut m = module(1, "", true, 0);
        m.category = r#"we"ird\dir"#.into();
        assert!(module_args(&m, &convention).starts_with(r#""we\"ird\\dir", 1, "#));
        assert_eq!(loader_args(Some(r#"a"b"#)), r#""a\"b""#);
        assert_eq!(loader_args(Some("u")), r#""u""#);
        assert_eq!(loader_args(None), "undefined");
    }

    #[test]
    fn test_emit_with_loader() {
        let fs = MemoryFileSystem::new();
        fs.write_file_at(
            Path::new("/js/Loader.js"),
            b"const _jsUtilsLoader = ((v) => {})();",
            SystemTime::UNIX_EPOCH + Duration::from_secs(50),
        )
        .unwrap();
        let convention = Convention::default();
        let set = set(
            vec![
                module(0, "((c, Script) => {})();", true, 10),
                module(1, "plain();", false, 20),
            ],
            vec![1, 0],
            Some("u"),
        );

        let bundle = BundleEmitter::new(&fs, &convention).emit(&set).unwrap();
        assert_eq!(
            bundle.text,
            "\nconst _jsUtilsLoader = ((v) => {})(\"u\");\
             \nplain();\
             \n((c, Script) => {})(\".\", 0, \"\", \"v0\", _jsUtilsLoader.Script);\
             \n_jsUtilsLoader.exec();"
        );
        assert_eq!(bundle.newest_mtime, SystemTime::UNIX_EPOCH + Duration::from_secs(50));
        assert_eq!(bundle.loader, Some(PathBuf::from("/js/Loader.js")));
        assert_eq!(
            bundle.order,
            vec![
                ModuleKey::Numbered(ModuleId::new(".", 1)),
                ModuleKey::Numbered(ModuleId::new(".", 0)),
            ]
        );
    }

    #[test]
    fn test_missing_loader_is_not_fatal() {
        let fs = MemoryFileSystem::new();
        let convention = Convention::default();
        let set = set(vec![module(0, "((c, Script) => {})();", true, 10)], vec![0], None);

        let bundle = BundleEmitter::new(&fs, &convention).emit(&set).unwrap();
        assert_eq!(
            bundle.text,
            "\n((c, Script) => {})(\".\", 0, \"\", \"v0\", _jsUtilsLoader.Script);\n_jsUtilsLoader.exec();"
        );
        assert_eq!(bundle.loader, None);
    }

    #[test]
    fn test_plain_modules_are_concatenated_without_trailer() {
        let fs = MemoryFileSystem::new();
        fs.write_file(Path::new("/js/Loader.js"), b"loader();").unwrap();
        let convention = Convention::default();
        let set = set(
            vec![module(0, "a();", false, 5), module(1, "b();", false, 7)],
            vec![0, 1],
            None,
        );

        let bundle = BundleEmitter::new(&fs, &convention).emit(&set).unwrap();
        assert_eq!(bundle.text, "\na();\nb();");
        assert_eq!(bundle.newest_mtime, SystemTime::UNIX_EPOCH + Duration::from_secs(7));
    }
}

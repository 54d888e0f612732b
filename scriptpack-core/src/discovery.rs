//! 文件发现
//!
//! 把一个请求解析为候选模块：直接读取单个文件，或按分类掩码扫描目录。
//! 每个文件都经过元数据提取，未知的依赖编号汇总为 `UnresolvedSet`。

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path, PathBuf};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use scriptpack_config::Convention;
use scriptpack_vfs::VirtualFileSystem;
use tracing::{debug, instrument, trace, warn};

use crate::error::{BundleError, BundleResult};
use crate::mask::BitMask;
use crate::metadata;
use crate::module::{Dependencies, Module, ModuleKey};
use crate::reference::ModuleId;
use crate::request::{CategoryMask, Request};

const TARGET: &str = "scriptpack::discovery";

/// 尚未找到的依赖
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unresolved {
    pub id: ModuleId,
    /// 任一引用方把它声明为 compile 或 launch 即为必需
    pub mandatory: bool,
    pub referrers: Vec<ModuleKey>,
}

pub type UnresolvedSet = BTreeMap<ModuleId, Unresolved>;

/// 一次发现的结果
#[derive(Debug, Default)]
pub struct Discovery {
    /// 新发现的模块，按键排序
    pub modules: Vec<Module>,
    pub unresolved: UnresolvedSet,
}

/// 基于虚拟文件系统的文件发现
pub struct FileDiscovery<'a> {
    vfs: &'a dyn VirtualFileSystem,
    convention: &'a Convention,
}

impl<'a> FileDiscovery<'a> {
    pub fn new(vfs: &'a dyn VirtualFileSystem, convention: &'a Convention) -> Self {
        Self { vfs, convention }
    }

    /// 执行一次发现
    ///
    /// `existing` 中的模块不会被重复读取，它们的编号也不会出现在未解析集合中。
    #[instrument(target = "scriptpack::discovery", level = "debug", skip_all, fields(dir = %request.dir().display()))]
    pub fn discover(
        &self,
        request: &Request,
        existing: &BTreeSet<ModuleKey>,
    ) -> BundleResult<Discovery> {
        let mut modules: BTreeMap<ModuleKey, Module> = BTreeMap::new();

        match request {
            Request::File(path) => {
                if let Some(module) = self.load_file(path)? {
                    if !existing.contains(&module.key) {
                        modules.insert(module.key.clone(), module);
                    }
                }
            }
            Request::Masks { dir, masks, .. } => {
                for (category, mask) in masks {
                    self.scan_category(dir, category, mask, existing, &mut modules)?;
                }
            }
        }

        let mut unresolved = UnresolvedSet::new();
        for module in modules.values() {
            for (kind, id) in module.declared.iter() {
                let key = ModuleKey::Numbered(id.clone());
                if existing.contains(&key) || modules.contains_key(&key) {
                    continue;
                }
                let entry = unresolved.entry(id.clone()).or_insert_with(|| Unresolved {
                    id: id.clone(),
                    mandatory: false,
                    referrers: Vec::new(),
                });
                entry.mandatory |= kind.is_mandatory();
                if !entry.referrers.contains(&module.key) {
                    entry.referrers.push(module.key.clone());
                }
            }
        }

        debug!(
            target: TARGET,
            found = modules.len(),
            unresolved = unresolved.len(),
            "Discovery pass finished"
        );

        Ok(Discovery {
            modules: modules.into_values().collect(),
            unresolved,
        })
    }

    fn scan_category(
        &self,
        dir: &Path,
        category: &str,
        mask: &CategoryMask,
        existing: &BTreeSet<ModuleKey>,
        modules: &mut BTreeMap<ModuleKey, Module>,
    ) -> BundleResult<()> {
        let category = self.convention.canonical_category(category);
        let Some(category_dir) = self.category_dir(dir, category) else {
            warn!(target: TARGET, category, "Category escapes the request directory, skipped");
            return Ok(());
        };

        if !self.vfs.is_dir(&category_dir) {
            debug!(target: TARGET, dir = %category_dir.display(), "Category directory does not exist");
            return Ok(());
        }
        let entries = match self.vfs.read_dir(&category_dir) {
            Ok(entries) => entries,
            Err(err) if err.is_not_found() => return Ok(()),
            Err(source) => {
                return Err(BundleError::Io {
                    path: category_dir,
                    source,
                })
            }
        };

        for file_name in entries {
            let Some(sub_id) = module_file_id(&file_name, &self.convention.extension) else {
                continue;
            };
            if !mask.includes(sub_id) {
                continue;
            }
            let key = ModuleKey::Numbered(ModuleId::new(category, sub_id));
            if existing.contains(&key) || modules.contains_key(&key) {
                trace!(target: TARGET, %key, "Already discovered");
                continue;
            }
            let path = category_dir.join(&file_name);
            if !self.vfs.is_file(&path) {
                continue;
            }
            if let Some(module) = self.load(path, key, category, Some(sub_id))? {
                modules.insert(module.key.clone(), module);
            }
        }

        Ok(())
    }

    /// 默认分类对应请求目录本身
    fn category_dir(&self, dir: &Path, category: &str) -> Option<PathBuf> {
        if category == self.convention.default_category {
            return Some(dir.to_path_buf());
        }
        let relative = Path::new(category);
        let contained = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        contained.then(|| dir.join(relative))
    }

    /// 直接请求的文件；文件名符合编号规则时按默认分类编号
    fn load_file(&self, path: &Path) -> BundleResult<Option<Module>> {
        let category = self.convention.default_category.as_str();
        let sub_id = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(|name| module_file_id(name, &self.convention.extension));
        let key = match sub_id {
            Some(sub_id) => ModuleKey::Numbered(ModuleId::new(category, sub_id)),
            None => ModuleKey::File(path.to_path_buf()),
        };
        self.load(path.to_path_buf(), key, category, sub_id)
    }

    /// 读取并分析一个模块文件；文件在读取前消失时返回 `None`
    fn load(
        &self,
        path: PathBuf,
        key: ModuleKey,
        category: &str,
        sub_id: Option<u32>,
    ) -> BundleResult<Option<Module>> {
        let bytes = match self.vfs.read_file(&path) {
            Ok(bytes) => bytes,
            Err(err) if err.is_not_found() => {
                debug!(target: TARGET, path = %path.display(), "File not found");
                return Ok(None);
            }
            Err(source) => return Err(BundleError::Io { path, source }),
        };
        let mtime = match self.vfs.modified(&path) {
            Ok(mtime) => mtime,
            Err(source) => return Err(BundleError::Io { path, source }),
        };
        let source = match String::from_utf8(bytes) {
            Ok(source) => source,
            Err(_) => return Err(BundleError::Encoding { path }),
        };

        let metadata = metadata::extract(&source, self.convention);
        debug!(
            target: TARGET,
            %key,
            self_registering = metadata.is_self_registering,
            dependencies = metadata.dependencies.len(),
            "Discovered module"
        );

        Ok(Some(Module {
            key,
            path,
            category: category.to_string(),
            sub_id,
            source,
            mtime,
            version: format_version(mtime),
            is_self_registering: metadata.is_self_registering,
            declared: metadata.dependencies,
            dependencies: Dependencies::default(),
            power_id: BitMask::new(),
            weight: BitMask::new(),
            compile_weight: BitMask::new(),
            diagnostics: metadata.diagnostics,
        }))
    }
}

/// 模块文件名 `<digits><sep>...<.ext>` 中的编号，`<sep>` 为 `_`、`.`、`-`
pub fn module_file_id(file_name: &str, extension: &str) -> Option<u32> {
    let digits_end = file_name
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(file_name.len());
    if digits_end == 0 {
        return None;
    }
    let rest = &file_name[digits_end..];
    if !rest.starts_with(&['_', '.', '-'][..]) {
        return None;
    }
    let stem = rest.strip_suffix(extension)?;
    if !stem.ends_with('.') {
        return None;
    }
    file_name[..digits_end].parse().ok()
}

/// 版本号：修改时间的 UTC `%Y%m%d.%H%M%S`
pub fn format_version(mtime: SystemTime) -> String {
    let time: DateTime<Utc> = mtime.into();
    time.format("%Y%m%d.%H%M%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scriptpack_vfs::MemoryFileSystem;
    use std::time::Duration;

    const SELF_REGISTERING: &str = "((cat, id, v, autoVersion, Script) => {\n";

    fn module_source(body: &str) -> String {
        format!("{}{}\n}})();", SELF_REGISTERING, body)
    }

    fn fixture() -> MemoryFileSystem {
        let fs = MemoryFileSystem::new();
        fs.write_file(
            Path::new("/js/0_types.js"),
            module_source("").as_bytes(),
        )
        .unwrap();
        fs.write_file(
            Path::new("/js/1.dom.js"),
            module_source("_.setCompileDependencies({u: 0});").as_bytes(),
        )
        .unwrap();
        fs.write_file(
            Path::new("/js/2-events.js"),
            module_source("_.setLaunchDependencies([1, 'lib-4']);\n_.setOptionalDependencies([9]);")
                .as_bytes(),
        )
        .unwrap();
        fs.write_file(Path::new("/js/notes.js"), b"// not numbered").unwrap();
        fs.write_file(Path::new("/js/3.txt"), b"wrong extension").unwrap();
        fs.write_file(Path::new("/js/4.js"), b"plain").unwrap();
        fs
    }

    fn keys(discovery: &Discovery) -> Vec<String> {
        discovery.modules.iter().map(|m| m.key.to_string()).collect()
    }

    #[test]
    fn test_module_file_id() {
        assert_eq!(module_file_id("0_types.js", "js"), Some(0));
        assert_eq!(module_file_id("12-a.b.js", "js"), Some(12));
        assert_eq!(module_file_id("3.js", "js"), Some(3));
        assert_eq!(module_file_id("3.", "js"), None);
        assert_eq!(module_file_id("3x.js", "js"), None);
        assert_eq!(module_file_id("3_a.jsx", "js"), None);
        assert_eq!(module_file_id("Loader.js", "js"), None);
    }

    #[test]
    fn test_format_version() {
        let mtime = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(format_version(mtime), "20231114.221320");
    }

    #[test]
    fn test_wildcard_scan() {
        let fs = fixture();
        let convention = Convention::default();
        let request = Request::parse(Path::new("/"), "js/*.js", &convention).unwrap();
        let discovery = FileDiscovery::new(&fs, &convention)
            .discover(&request, &BTreeSet::new())
            .unwrap();

        assert_eq!(keys(&discovery), vec![".-0", ".-1", ".-2", ".-4"]);
        let unresolved: Vec<_> = discovery.unresolved.values().collect();
        assert_eq!(unresolved.len(), 2);
        assert_eq!(unresolved[0].id, ModuleId::new(".", 9));
        assert!(!unresolved[0].mandatory);
        assert_eq!(unresolved[1].id, ModuleId::new("lib", 4));
        assert!(unresolved[1].mandatory);
        assert_eq!(
            unresolved[1].referrers,
            vec![ModuleKey::Numbered(ModuleId::new(".", 2))]
        );
    }

    #[test]
    fn test_mask_scan_reports_missing_known_ids() {
        let fs = fixture();
        let convention = Convention::default();
        // 4 = 第 2 位
        let request = Request::parse(Path::new("/"), "js/4.js", &convention).unwrap();
        let discovery = FileDiscovery::new(&fs, &convention)
            .discover(&request, &BTreeSet::new())
            .unwrap();

        assert_eq!(keys(&discovery), vec![".-2"]);
        assert!(discovery.unresolved.contains_key(&ModuleId::new(".", 1)));
        assert!(discovery.unresolved[&ModuleId::new(".", 1)].mandatory);
    }

    #[test]
    fn test_existing_modules_are_skipped() {
        let fs = fixture();
        let convention = Convention::default();
        let existing: BTreeSet<_> = [ModuleKey::Numbered(ModuleId::new(".", 1))].into();
        let request = Request::for_ids(Path::new("/js"), &[ModuleId::new(".", 1), ModuleId::new(".", 2)]);
        let discovery = FileDiscovery::new(&fs, &convention)
            .discover(&request, &existing)
            .unwrap();

        assert_eq!(keys(&discovery), vec![".-2"]);
        assert!(!discovery.unresolved.contains_key(&ModuleId::new(".", 1)));
    }

    #[test]
    fn test_missing_directory_yields_nothing() {
        let fs = fixture();
        let convention = Convention::default();
        let request = Request::for_ids(Path::new("/js"), &[ModuleId::new("lib", 4)]);
        let discovery = FileDiscovery::new(&fs, &convention)
            .discover(&request, &BTreeSet::new())
            .unwrap();
        assert!(discovery.modules.is_empty());
    }

    #[test]
    fn test_direct_file_request() {
        let fs = fixture();
        let convention = Convention::default();
        let discovery = FileDiscovery::new(&fs, &convention)
            .discover(&Request::File(PathBuf::from("/js/notes.js")), &BTreeSet::new())
            .unwrap();
        assert_eq!(discovery.modules.len(), 1);
        assert_eq!(discovery.modules[0].key, ModuleKey::File(PathBuf::from("/js/notes.js")));
        assert_eq!(discovery.modules[0].sub_id, None);

        let discovery = FileDiscovery::new(&fs, &convention)
            .discover(&Request::File(PathBuf::from("/js/1.dom.js")), &BTreeSet::new())
            .unwrap();
        assert_eq!(keys(&discovery), vec![".-1"]);
    }

    #[test]
    fn test_invalid_utf8_is_an_error() {
        let fs = MemoryFileSystem::new();
        fs.write_file(Path::new("/js/0_bad.js"), &[0xff, 0xfe]).unwrap();
        let convention = Convention::default();
        let request = Request::parse(Path::new("/"), "js/1.js", &convention).unwrap();
        let err = FileDiscovery::new(&fs, &convention)
            .discover(&request, &BTreeSet::new())
            .unwrap_err();
        assert!(matches!(err, BundleError::Encoding { .. }));
    }

    #[test]
    fn test_category_cannot_escape() {
        let fs = fixture();
        let convention = Convention::default();
        let request = Request::for_ids(Path::new("/js/sub"), &[ModuleId::new("..", 0)]);
        let discovery = FileDiscovery::new(&fs, &convention)
            .discover(&request, &BTreeSet::new())
            .unwrap();
        assert!(discovery.modules.is_empty());
    }
}

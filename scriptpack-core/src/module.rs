//! 模块与模块集合
//!
//! `Module` 是一次打包中发现的单个源文件；`ModuleSet` 按模块键排序保存全部模块，
//! 依赖在图构建后解析为集合内下标。

use std::fmt;
use std::fmt::Write as _;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::mask::BitMask;
use crate::reference::{DependencyKind, ModuleId};

/// 模块键
///
/// 编号模块按 `(category, sub_id)` 排序，且总是排在文件模块之前。
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ModuleKey {
    Numbered(ModuleId),
    File(PathBuf),
}

impl ModuleKey {
    pub fn id(&self) -> Option<&ModuleId> {
        match self {
            ModuleKey::Numbered(id) => Some(id),
            ModuleKey::File(_) => None,
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModuleKey::Numbered(id) => write!(f, "{}", id),
            ModuleKey::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// 按依赖类型分组的三个列表
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dependencies<T> {
    pub compile: Vec<T>,
    pub launch: Vec<T>,
    pub optional: Vec<T>,
}

impl<T> Default for Dependencies<T> {
    fn default() -> Self {
        Self {
            compile: Vec::new(),
            launch: Vec::new(),
            optional: Vec::new(),
        }
    }
}

impl<T> Dependencies<T> {
    pub fn get(&self, kind: DependencyKind) -> &Vec<T> {
        match kind {
            DependencyKind::Compile => &self.compile,
            DependencyKind::Launch => &self.launch,
            DependencyKind::Optional => &self.optional,
        }
    }

    pub fn get_mut(&mut self, kind: DependencyKind) -> &mut Vec<T> {
        match kind {
            DependencyKind::Compile => &mut self.compile,
            DependencyKind::Launch => &mut self.launch,
            DependencyKind::Optional => &mut self.optional,
        }
    }

    /// 依次遍历 compile、launch、optional
    pub fn iter(&self) -> impl Iterator<Item = (DependencyKind, &T)> + '_ {
        DependencyKind::ALL
            .into_iter()
            .flat_map(move |kind| self.get(kind).iter().map(move |item| (kind, item)))
    }

    pub fn len(&self) -> usize {
        self.compile.len() + self.launch.len() + self.optional.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 一个被发现的模块文件
#[derive(Debug, Clone)]
pub struct Module {
    pub key: ModuleKey,
    pub path: PathBuf,
    pub category: String,
    /// 文件名前导数字；文件模块可能没有
    pub sub_id: Option<u32>,
    pub source: String,
    pub mtime: SystemTime,
    /// `mtime` 的 UTC 格式 `%Y%m%d.%H%M%S`
    pub version: String,
    pub is_self_registering: bool,
    /// 源码中声明的依赖
    pub declared: Dependencies<ModuleId>,
    /// 解析后的依赖（`ModuleSet::modules` 下标）
    pub dependencies: Dependencies<usize>,
    pub power_id: BitMask,
    pub weight: BitMask,
    pub compile_weight: BitMask,
    /// 元数据提取中的非致命问题
    pub diagnostics: Vec<String>,
}

impl Module {
    /// DOT 图中的节点标签
    fn dot_label(&self) -> String {
        let id = self
            .sub_id
            .map(|id| id.to_string())
            .unwrap_or_else(|| "?".to_string());
        format!(
            "\"{}-{} [{}, {}, {}]\"",
            self.category, id, self.power_id, self.weight, self.compile_weight
        )
    }
}

/// 一次打包的全部模块
#[derive(Debug, Clone)]
pub struct ModuleSet {
    /// 按 `key` 升序
    pub modules: Vec<Module>,
    /// 排序后的输出顺序（`modules` 下标）
    pub order: Vec<usize>,
    /// 请求目录，加载器脚本在此查找
    pub dir: PathBuf,
    /// 请求中给出的逻辑名
    pub name: Option<String>,
}

impl ModuleSet {
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn position(&self, key: &ModuleKey) -> Option<usize> {
        self.modules.binary_search_by(|m| m.key.cmp(key)).ok()
    }

    pub fn find(&self, id: &ModuleId) -> Option<usize> {
        self.position(&ModuleKey::Numbered(id.clone()))
    }

    /// 按输出顺序遍历；排序前为键顺序
    pub fn ordered(&self) -> impl Iterator<Item = &Module> + '_ {
        let order: Box<dyn Iterator<Item = usize>> = if self.order.len() == self.modules.len() {
            Box::new(self.order.iter().copied())
        } else {
            Box::new(0..self.modules.len())
        };
        order.map(move |index| &self.modules[index])
    }

    pub fn has_self_registering(&self) -> bool {
        self.modules.iter().any(|m| m.is_self_registering)
    }

    /// 输出顺序下的模块键
    pub fn ordered_keys(&self) -> Vec<ModuleKey> {
        self.ordered().map(|m| m.key.clone()).collect()
    }

    /// 以 Graphviz DOT 描述依赖图
    ///
    /// 节点标签为 `"cat-id [power, weight, compile_weight]"`，逆输出顺序列出；
    /// 没有依赖的模块作为孤立节点出现。
    pub fn to_dot(&self) -> String {
        let mut graph = String::from("digraph G {");
        let modules: Vec<&Module> = self.ordered().collect();
        for module in modules.into_iter().rev() {
            let from = module.dot_label();
            if module.dependencies.is_empty() {
                let _ = write!(graph, "\n\t{}", from);
                continue;
            }
            for (kind, &dep) in module.dependencies.iter() {
                let to = self.modules[dep].dot_label();
                let _ = write!(graph, "\n\t{} -> {} [label=\"{}\"]", from, to, kind);
            }
        }
        graph.push_str("\n}");
        graph
    }
}

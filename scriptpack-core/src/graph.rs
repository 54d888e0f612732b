//! 依赖图构建
//!
//! 从种子请求开始反复调用文件发现，直到没有新的未请求编号（不动点）。
//! 之后仍未找到的必需依赖是致命错误，可选依赖被丢弃，
//! 其余声明解析为 `ModuleSet` 内的下标。

use std::collections::{BTreeMap, BTreeSet};

use scriptpack_config::Convention;
use scriptpack_vfs::VirtualFileSystem;
use tracing::{debug, info, instrument};

use crate::discovery::{FileDiscovery, UnresolvedSet};
use crate::error::{BundleError, BundleResult, MissingModule};
use crate::module::{Module, ModuleKey, ModuleSet};
use crate::reference::{DependencyKind, ModuleId};
use crate::request::Request;

const TARGET: &str = "scriptpack::graph";

/// 依赖图构建器
pub struct DependencyGraphBuilder<'a> {
    discovery: FileDiscovery<'a>,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(vfs: &'a dyn VirtualFileSystem, convention: &'a Convention) -> Self {
        Self {
            discovery: FileDiscovery::new(vfs, convention),
        }
    }

    /// 构建模块集合
    ///
    /// # Errors
    /// - `NothingToBundle`：请求没有匹配任何文件
    /// - `MissingDependency`：不动点后仍有必需依赖未找到
    #[instrument(target = "scriptpack::graph", level = "debug", skip_all, fields(request = %seed))]
    pub fn build(&self, seed: &Request) -> BundleResult<ModuleSet> {
        let dir = seed.dir().to_path_buf();
        let mut known: BTreeMap<ModuleKey, Module> = BTreeMap::new();
        let mut unresolved = UnresolvedSet::new();
        let mut requested: BTreeSet<ModuleId> = BTreeSet::new();
        let mut request = seed.clone();
        let mut pass = 0usize;

        loop {
            pass += 1;
            let existing: BTreeSet<ModuleKey> = known.keys().cloned().collect();
            let found = self.discovery.discover(&request, &existing)?;
            debug!(target: TARGET, pass, found = found.modules.len(), "Discovery pass");

            for module in found.modules {
                if let Some(id) = module.key.id() {
                    unresolved.remove(id);
                }
                known.insert(module.key.clone(), module);
            }
            merge_unresolved(&mut unresolved, found.unresolved);

            let pending: Vec<ModuleId> = unresolved
                .keys()
                .filter(|id| !requested.contains(*id))
                .cloned()
                .collect();
            if pending.is_empty() {
                break;
            }
            debug!(target: TARGET, pending = pending.len(), "Requesting unresolved dependencies");
            request = Request::for_ids(&dir, &pending);
            requested.extend(pending);
        }

        if known.is_empty() {
            return Err(BundleError::NothingToBundle {
                request: seed.to_string(),
            });
        }

        let missing: Vec<MissingModule> = unresolved
            .values()
            .filter(|entry| entry.mandatory)
            .map(|entry| MissingModule {
                id: entry.id.clone(),
                referrers: entry.referrers.iter().map(ToString::to_string).collect(),
            })
            .collect();
        if !missing.is_empty() {
            return Err(BundleError::MissingDependency { missing });
        }
        for entry in unresolved.values() {
            debug!(target: TARGET, id = %entry.id, "Dropping unresolved optional dependency");
        }

        let mut set = ModuleSet {
            modules: known.into_values().collect(),
            order: Vec::new(),
            dir,
            name: seed.name().map(str::to_string),
        };
        resolve_dependencies(&mut set);

        info!(target: TARGET, modules = set.len(), passes = pass, "Dependency graph built");
        Ok(set)
    }
}

/// 必需性取“或”：任一引用方声明为必需即必需
fn merge_unresolved(into: &mut UnresolvedSet, from: UnresolvedSet) {
    for (id, entry) in from {
        match into.get_mut(&id) {
            Some(existing) => {
                existing.mandatory |= entry.mandatory;
                for referrer in entry.referrers {
                    if !existing.referrers.contains(&referrer) {
                        existing.referrers.push(referrer);
                    }
                }
            }
            None => {
                into.insert(id, entry);
            }
        }
    }
}

/// 把声明的编号解析为下标，同类依赖去重，找不到的移除
fn resolve_dependencies(set: &mut ModuleSet) {
    for index in 0..set.modules.len() {
        for kind in DependencyKind::ALL {
            let mut resolved: Vec<usize> = Vec::new();
            for id in set.modules[index].declared.get(kind) {
                match set.find(id) {
                    Some(target) if !resolved.contains(&target) => resolved.push(target),
                    Some(_) => {}
                    None => debug!(
                        target: TARGET,
                        module = %set.modules[index].key,
                        %id,
                        "Dependency link removed"
                    ),
                }
            }
            *set.modules[index].dependencies.get_mut(kind) = resolved;
        }
    }
}

//! 输出顺序
//!
//! 权重越大（被越多模块依赖）越靠前：先比较 `compile_weight`，再比较 `weight`，
//! 然后按 `power_id` 升序，最后按模块键升序保证完全确定。
//!
//! 比较器只决定优先级。实际顺序由一次拓扑遍历产生：依赖全部输出后模块才就绪，
//! 就绪模块中按比较器取最靠前的一个。只有 launch / optional 依赖成环时才会
//! 强制输出一个未就绪模块，此时优先选 compile 依赖已全部输出的模块。

use std::cmp::Ordering;
use std::collections::BTreeSet;

use tracing::debug;

use crate::module::{Module, ModuleSet};
use crate::reference::DependencyKind;

const TARGET: &str = "scriptpack::weight";

pub fn compare(a: &Module, b: &Module) -> Ordering {
    b.compile_weight
        .cmp(&a.compile_weight)
        .then_with(|| b.weight.cmp(&a.weight))
        .then_with(|| a.power_id.cmp(&b.power_id))
        .then_with(|| a.key.cmp(&b.key))
}

/// 计算 `set.order`
pub fn sort(set: &mut ModuleSet) {
    let modules = &set.modules;
    let count = modules.len();

    let mut by_priority: Vec<usize> = (0..count).collect();
    by_priority.sort_by(|&a, &b| compare(&modules[a], &modules[b]));
    let mut rank = vec![0usize; count];
    for (position, &index) in by_priority.iter().enumerate() {
        rank[index] = position;
    }

    // 每个模块尚未输出的依赖数（全部种类 / 仅 compile），以及反向边
    let mut pending = vec![0usize; count];
    let mut pending_compile = vec![0usize; count];
    let mut dependents: Vec<Vec<(usize, bool)>> = vec![Vec::new(); count];
    for (index, module) in modules.iter().enumerate() {
        let mut all: BTreeSet<usize> = BTreeSet::new();
        let mut compile: BTreeSet<usize> = BTreeSet::new();
        for (kind, &dep) in module.dependencies.iter() {
            if dep == index {
                continue;
            }
            all.insert(dep);
            if kind == DependencyKind::Compile {
                compile.insert(dep);
            }
        }
        pending[index] = all.len();
        pending_compile[index] = compile.len();
        for dep in all {
            dependents[dep].push((index, compile.contains(&dep)));
        }
    }

    // 就绪集合按优先级（rank）排序
    let mut ready: BTreeSet<(usize, usize)> = (0..count)
        .filter(|&index| pending[index] == 0)
        .map(|index| (rank[index], index))
        .collect();
    let mut emitted = vec![false; count];
    let mut order = Vec::with_capacity(count);

    while order.len() < count {
        let next = match ready.pop_first() {
            Some((_, index)) => index,
            None => {
                let forced = by_priority
                    .iter()
                    .copied()
                    .filter(|&index| !emitted[index])
                    .find(|&index| pending_compile[index] == 0)
                    .or_else(|| by_priority.iter().copied().find(|&index| !emitted[index]));
                let Some(forced) = forced else { break };
                debug!(
                    target: TARGET,
                    module = %modules[forced].key,
                    "Dependency cycle without compile edges, emitting by priority"
                );
                forced
            }
        };
        if emitted[next] {
            continue;
        }
        emitted[next] = true;
        order.push(next);

        for &(dependent, is_compile) in &dependents[next] {
            pending[dependent] -= 1;
            if is_compile {
                pending_compile[dependent] -= 1;
            }
            if pending[dependent] == 0 && !emitted[dependent] {
                ready.insert((rank[dependent], dependent));
            }
        }
    }

    set.order = order;

    debug!(
        target: TARGET,
        order = ?set.ordered_keys().iter().map(ToString::to_string).collect::<Vec<_>>(),
        "Modules ordered"
    );
}

//! 权重分配
//!
//! 每个自注册模块得到唯一的 `power_id = 2^(分类偏移 + 分类内序号)`，
//! 随后沿依赖边传播祖先位集合：
//!
//! - `weight`：所有（传递地）依赖本模块的模块
//! - `compile_weight`：只沿 compile 边传播；若传入值含本模块的位则 compile 依赖成环
//!
//! 传播使用显式栈，深依赖链不会耗尽调用栈。

use std::collections::BTreeMap;

use tracing::{debug, instrument, trace};

use crate::error::{BundleError, BundleResult};
use crate::mask::BitMask;
use crate::module::{Module, ModuleSet};
use crate::reference::DependencyKind;

const TARGET: &str = "scriptpack::weight";

/// 分配 power id 并计算全部权重
#[instrument(target = "scriptpack::weight", level = "debug", skip_all, fields(modules = set.len()))]
pub fn assign(set: &mut ModuleSet) -> BundleResult<()> {
    assign_power_ids(&mut set.modules);
    propagate(&mut set.modules)
}

/// 分类内按键顺序编号，分类按名称排序后连续排布
pub fn assign_power_ids(modules: &mut [Module]) {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    let mut local = vec![None; modules.len()];
    for (index, module) in modules.iter().enumerate() {
        if module.is_self_registering {
            let count = counts.entry(module.category.clone()).or_insert(0);
            local[index] = Some(*count);
            *count += 1;
        }
    }

    let mut offsets: BTreeMap<String, usize> = BTreeMap::new();
    let mut next = 0;
    for (category, count) in counts {
        offsets.insert(category, next);
        next += count;
    }

    for (module, local) in modules.iter_mut().zip(local) {
        module.power_id = match local {
            Some(local) => BitMask::bit(offsets[&module.category] + local),
            None => BitMask::new(),
        };
        module.weight = BitMask::new();
        module.compile_weight = BitMask::new();
    }
    debug!(target: TARGET, bits = next, "Power ids assigned");
}

/// 以每个模块为根传播权重
pub fn propagate(modules: &mut [Module]) -> BundleResult<()> {
    let edges: Vec<Vec<(usize, bool)>> = modules
        .iter()
        .map(|module| {
            module
                .dependencies
                .iter()
                .map(|(kind, &dep)| (dep, kind == DependencyKind::Compile))
                .collect()
        })
        .collect();

    // (模块, 下一条待访问的边)
    let mut stack: Vec<(usize, usize)> = Vec::new();
    let empty = BitMask::new();

    for root in 0..modules.len() {
        if visit(modules, root, &empty, &empty, &stack)? {
            stack.push((root, 0));
        }

        while let Some(&(current, next)) = stack.last() {
            let Some(&(dep, is_compile)) = edges[current].get(next) else {
                stack.pop();
                continue;
            };
            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            let module = &modules[current];
            let weight = &module.weight | &module.power_id;
            let compile_weight = if is_compile {
                &module.compile_weight | &module.power_id
            } else {
                BitMask::new()
            };
            if visit(modules, dep, &weight, &compile_weight, &stack)? {
                stack.push((dep, 0));
            }
        }
    }

    Ok(())
}

/// 把传入的位集合并到模块上，返回是否需要继续访问其依赖
fn visit(
    modules: &mut [Module],
    index: usize,
    incoming: &BitMask,
    incoming_compile: &BitMask,
    stack: &[(usize, usize)],
) -> BundleResult<bool> {
    let module = &mut modules[index];
    let power_id = &module.power_id;

    let weight = if incoming.intersects(power_id) {
        incoming ^ power_id
    } else {
        incoming.clone()
    };
    let compile_loop = incoming_compile.intersects(power_id);
    let compile_weight = if compile_loop {
        incoming_compile ^ power_id
    } else {
        incoming_compile.clone()
    };

    let previous = module.weight.clone();
    module.weight |= &weight;
    module.compile_weight |= &compile_weight;

    if compile_loop {
        return Err(BundleError::CompileDependencyCycle {
            modules: cycle_members(modules, index, incoming_compile, stack),
        });
    }

    let changed = previous != module.weight;
    trace!(target: TARGET, module = %module.key, weight = %module.weight, changed, "Visited");
    Ok(incoming.is_empty() || changed)
}

/// 环上的模块：当前访问路径上从该模块开始的部分；
/// 不在路径上时取传入 compile 权重中置位的模块
fn cycle_members(
    modules: &[Module],
    index: usize,
    incoming_compile: &BitMask,
    stack: &[(usize, usize)],
) -> Vec<String> {
    let mut members: Vec<String> = match stack.iter().position(|&(i, _)| i == index) {
        Some(start) => stack[start..]
            .iter()
            .map(|&(i, _)| modules[i].key.to_string())
            .collect(),
        None => incoming_compile
            .ones()
            .filter_map(|bit| modules.iter().find(|m| m.power_id.contains(bit)))
            .map(|m| m.key.to_string())
            .collect(),
    };
    members.push(modules[index].key.to_string());
    members
}

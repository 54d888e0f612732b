//! 测试辅助工具
//!
//! 提供模块源码模板与内存文件系统夹具

#![allow(dead_code)]

use scriptpack_core::{Bundle, Bundler, Convention, ModuleSet};
use scriptpack_vfs::MemoryFileSystem;
use std::path::Path;
use std::time::{Duration, SystemTime};

/// 自注册模块的包装头
pub const HEADER: &str =
    "((cat, id, varName = document?.currentScript?.dataset?.var, autoVersion, Script) => {\n\tconst _ = new Script(id, autoVersion);\n";

/// 生成一个自注册模块，`body` 放在包装函数内
///
/// # Example
/// ```ignore
/// let source = script("_.setLaunchDependencies([1]);");
/// ```
pub fn script(body: &str) -> String {
    format!("{}\t{}\n}})();", HEADER, body)
}

/// 某个时刻（自 UNIX 纪元起的秒数）
pub fn at(secs: u64) -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
}

/// 创建测试用的内存文件系统，所有文件的修改时间相同
pub fn create_test_fs(files: &[(&str, String)]) -> MemoryFileSystem {
    let fs = MemoryFileSystem::new();
    for (path, content) in files {
        fs.write_file_at(Path::new(path), content.as_bytes(), at(1_700_000_000))
            .expect("fixture write");
    }
    fs
}

pub fn bundler(fs: MemoryFileSystem) -> Bundler {
    Bundler::new(Box::new(fs), "/", Convention::default())
}

/// 打包并返回结果
pub fn bundle(files: &[(&str, String)], request: &str) -> Bundle {
    bundler(create_test_fs(files))
        .bundle_path(request)
        .expect("bundling failed")
}

/// 解析并返回排序后的模块集合
pub fn resolve(files: &[(&str, String)], request: &str) -> ModuleSet {
    let bundler = bundler(create_test_fs(files));
    let request = bundler.request(request).expect("invalid request");
    bundler.resolve(&request).expect("resolution failed")
}

/// 输出顺序下的模块名
pub fn order(bundle: &Bundle) -> Vec<String> {
    bundle.order.iter().map(|key| key.to_string()).collect()
}

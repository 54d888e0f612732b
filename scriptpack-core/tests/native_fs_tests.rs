//! 基于本地文件系统的打包测试

mod common;

use common::script;
use scriptpack_core::{Bundler, Convention};
use scriptpack_vfs::NativeFileSystem;
use std::fs;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

/// 每个测试独占的临时目录，测试结束时删除
struct TempDir(PathBuf);

impl TempDir {
    fn new(name: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "scriptpack-{}-{}-{}",
            name,
            std::process::id(),
            nanos
        ));
        fs::create_dir_all(&path).unwrap();
        Self(path)
    }

    fn write(&self, relative: &str, content: &str) {
        let path = self.0.join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }
}

impl Drop for TempDir {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.0);
    }
}

fn bundler(dir: &TempDir) -> Bundler {
    Bundler::new(Box::new(NativeFileSystem::new()), &dir.0, Convention::default())
}

#[test]
fn test_bundle_from_disk() {
    let dir = TempDir::new("disk");
    dir.write("js/0_app.js", &script("_.setCompileDependencies(['lib-0']);"));
    dir.write("js/1_extra.js", &script("_.setLaunchDependencies([0]);"));
    dir.write("js/lib/0_core.js", &script(""));
    dir.write("js/Loader.js", "const _jsUtilsLoader = ((v) => {})();");
    dir.write("js/notes.txt", "ignored");

    let bundle = bundler(&dir).bundle_path("js/*.js").unwrap();
    let order: Vec<String> = bundle.order.iter().map(ToString::to_string).collect();
    assert_eq!(order, vec!["lib-0", ".-0", ".-1"]);
    assert!(bundle.text.starts_with("\nconst _jsUtilsLoader = ((v) => {})(undefined);"));
    assert!(bundle.text.ends_with("\n_jsUtilsLoader.exec();"));

    let newest = ["js/0_app.js", "js/1_extra.js", "js/lib/0_core.js", "js/Loader.js"]
        .iter()
        .map(|p| fs::metadata(dir.0.join(p)).unwrap().modified().unwrap())
        .max()
        .unwrap();
    assert_eq!(bundle.newest_mtime, newest);
}

#[test]
fn test_missing_category_directory() {
    let dir = TempDir::new("missing");
    dir.write("js/0_app.js", &script("_.setOptionalDependencies(['gone-4']);"));

    let bundle = bundler(&dir).bundle_path("js/1.js").unwrap();
    assert_eq!(bundle.order.len(), 1);
}

#[test]
fn test_category_that_is_a_file() {
    let dir = TempDir::new("file-category");
    dir.write("js/0_app.js", &script("_.setCompileDependencies(['lib-0']);"));
    dir.write("js/lib", "not a directory");

    let err = bundler(&dir).bundle_path("js/1.js").unwrap_err();
    assert!(err.to_string().contains("lib-0"), "{}", err);
}

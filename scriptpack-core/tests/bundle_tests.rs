//! 打包端到端测试

mod common;

use common::{at, bundle, bundler, create_test_fs, order, resolve, script};
use scriptpack_core::{BundleError, ModuleId, ModuleSet};
use std::path::Path;

fn position(order: &[String], name: &str) -> usize {
    order
        .iter()
        .position(|n| n == name)
        .unwrap_or_else(|| panic!("{} missing from {:?}", name, order))
}

/// 每条依赖边（任意种类，自环除外）的依赖都排在依赖方之前
fn assert_dependencies_first(set: &ModuleSet) {
    let names: Vec<String> = set.ordered().map(|m| m.key.to_string()).collect();
    for module in &set.modules {
        for (kind, &dep) in module.dependencies.iter() {
            let dependency = &set.modules[dep];
            if dependency.key == module.key {
                continue;
            }
            let dependent = position(&names, &module.key.to_string());
            let required = position(&names, &dependency.key.to_string());
            assert!(
                required < dependent,
                "{} ({:?}) must precede {} in {:?}",
                dependency.key,
                kind,
                module.key,
                names
            );
        }
    }
}

#[test]
fn test_order_respects_dependency_edges() {
    let files = [
        ("/js/0_app.js", script("_.setCompileDependencies([1, 2]);")),
        ("/js/1_dom.js", script("_.setCompileDependencies({u: 3});")),
        (
            "/js/2_events.js",
            script("_.setCompileDependencies([3]);\n\t_.setLaunchDependencies([4]);"),
        ),
        ("/js/3_types.js", script("")),
        (
            "/js/4_net.js",
            script("_.setCompileDependencies(['_-3']);\n\t_.setOptionalDependencies([1]);"),
        ),
    ];
    let set = resolve(&files, "js/*.js");

    let names: Vec<String> = set.ordered().map(|m| m.key.to_string()).collect();
    assert_eq!(names, vec![".-3", ".-1", ".-4", ".-2", ".-0"]);
    assert_dependencies_first(&set);
}

#[test]
fn test_launch_edge_into_compile_chain() {
    let files = [
        ("/js/0_a.js", script("_.setCompileDependencies([2]);")),
        ("/js/1_b.js", script("_.setLaunchDependencies([2]);")),
        ("/js/2_c.js", script("")),
        ("/js/3_d.js", script("_.setCompileDependencies([1]);")),
    ];
    let set = resolve(&files, "js/*.js");

    let names: Vec<String> = set.ordered().map(|m| m.key.to_string()).collect();
    assert_eq!(names, vec![".-2", ".-1", ".-0", ".-3"]);
    assert_dependencies_first(&set);
}

#[test]
fn test_bundles_are_deterministic() {
    let files = [
        ("/js/0_a.js", script("_.setLaunchDependencies([2, 1]);")),
        ("/js/1_b.js", script("_.setLaunchDependencies([0]);")),
        ("/js/2_c.js", script("")),
        ("/js/3_plain.js", "console.log('plain');".to_string()),
        ("/js/Loader.js", "const _jsUtilsLoader = (() => {})();".to_string()),
    ];
    let first = bundle(&files, "js/*.js");
    let second = bundle(&files, "js/*.js");
    assert_eq!(first.text, second.text);
    assert_eq!(first.order, second.order);

    let mut reversed = files.clone();
    reversed.reverse();
    assert_eq!(bundle(&reversed, "js/*.js").text, first.text);
}

#[test]
fn test_compile_cycle_is_fatal() {
    let files = [
        ("/js/0_a.js", script("_.setCompileDependencies([1]);")),
        ("/js/1_b.js", script("_.setCompileDependencies([0]);")),
    ];
    let err = bundler(create_test_fs(&files))
        .bundle_path("js/*.js")
        .unwrap_err();
    match err {
        BundleError::CompileDependencyCycle { modules } => {
            assert_eq!(modules, vec![".-0", ".-1", ".-0"]);
        }
        other => panic!("expected a compile cycle, got {:?}", other),
    }
}

#[test]
fn test_launch_cycle_is_allowed() {
    let files = [
        ("/js/0_a.js", script("_.setLaunchDependencies([1]);")),
        ("/js/1_b.js", script("_.setLaunchDependencies([0]);")),
    ];
    let result = bundle(&files, "js/*.js");
    assert_eq!(order(&result), vec![".-0", ".-1"]);
}

#[test]
fn test_fixpoint_discovery() {
    let files = [
        ("/js/0_a.js", script("_.setLaunchDependencies([1]);")),
        ("/js/1_b.js", script("_.setLaunchDependencies([2]);")),
        ("/js/2_c.js", script("")),
    ];
    // 掩码 1 只覆盖模块 0
    let result = bundle(&files, "js/1.js");
    assert_eq!(order(&result), vec![".-2", ".-1", ".-0"]);
}

#[test]
fn test_mandatory_wins_the_merge() {
    let files = [
        ("/js/0_x.js", script("_.setOptionalDependencies([5]);")),
        ("/js/1_z.js", script("_.setCompileDependencies([5]);")),
    ];
    let err = bundler(create_test_fs(&files))
        .bundle_path("js/*.js")
        .unwrap_err();
    match err {
        BundleError::MissingDependency { missing } => {
            assert_eq!(missing.len(), 1);
            assert_eq!(missing[0].id, ModuleId::new(".", 5));
        }
        other => panic!("expected a missing dependency, got {:?}", other),
    }
}

#[test]
fn test_argument_injection_changes_nothing_else() {
    let source = script("_.setLaunchDependencies([]);\n\tfoo();");
    let fs = create_test_fs(&[]);
    fs.write_file_at(Path::new("/js/7_mod.js"), source.as_bytes(), at(1_700_000_000))
        .unwrap();
    let result = bundler(fs).bundle_path("js/128.js").unwrap();

    let body = result
        .text
        .strip_prefix('\n')
        .and_then(|t| t.strip_suffix("\n_jsUtilsLoader.exec();"))
        .unwrap();
    let args = r#"".", 7, "", "20231114.221320", _jsUtilsLoader.Script"#;
    assert_eq!(args.split(", ").count(), 5);

    let insert_at = source.rfind("();").unwrap() + 1;
    let expected = format!("{}{}{}", &source[..insert_at], args, &source[insert_at..]);
    assert_eq!(body, expected);
    assert_eq!(body.replacen(args, "", 1), source);
}

#[test]
fn test_unresolvable_optional_dependency_keeps_order() {
    let base = [
        ("/js/0_a.js", script("_.setCompileDependencies([1]);")),
        ("/js/1_b.js", script("")),
        ("/js/2_c.js", script("_.setLaunchDependencies([0]);")),
    ];
    let with_optional = [
        (
            "/js/0_a.js",
            script("_.setCompileDependencies([1]);\n\t_.setOptionalDependencies([9]);"),
        ),
        ("/js/1_b.js", script("")),
        (
            "/js/2_c.js",
            script("_.setLaunchDependencies([0]);\n\t_.setOptionalDependencies(['lib-3']);"),
        ),
    ];
    assert_eq!(
        order(&bundle(&base, "js/*.js")),
        order(&bundle(&with_optional, "js/*.js"))
    );
}

#[test]
fn test_loader_prelude_receives_request_name() {
    let fs = create_test_fs(&[
        ("/js/0_a.js", script("")),
        ("/js/1_b.js", script("_.setCompileDependencies([0]);")),
    ]);
    fs.write_file_at(
        Path::new("/js/Loader.js"),
        b"const _jsUtilsLoader = ((varName) => {})();",
        at(1_800_000_000),
    )
    .unwrap();

    let result = bundler(fs).bundle_path("js/u:2.js").unwrap();
    assert!(result
        .text
        .starts_with("\nconst _jsUtilsLoader = ((varName) => {})(\"u\");\n"));
    assert!(result.text.ends_with("\n_jsUtilsLoader.exec();"));
    assert_eq!(order(&result), vec![".-0", ".-1"]);
    assert_eq!(result.newest_mtime, at(1_800_000_000));
    assert_eq!(result.loader.as_deref(), Some(Path::new("/js/Loader.js")));
}

#[test]
fn test_plain_files_have_no_prelude_or_trailer() {
    let files = [
        ("/js/0_a.js", "var a = 1;".to_string()),
        ("/js/Loader.js", "loader();".to_string()),
    ];
    let result = bundle(&files, "js/*.js");
    assert_eq!(result.text, "\nvar a = 1;");
    assert_eq!(result.loader, None);
}

#[test]
fn test_dependencies_in_other_categories() {
    let files = [
        ("/js/0_app.js", script("_.setCompileDependencies({ dom: 'lib-0' });")),
        ("/js/lib/0_dom.js", script("")),
    ];
    let result = bundle(&files, "js/1.js");
    assert_eq!(order(&result), vec!["lib-0", ".-0"]);
    assert!(result.text.contains(r#"})("lib", 0, "", "#));
}

#[test]
fn test_huge_module_ids() {
    let files = [
        (
            "/js/0_app.js",
            script("_.setOptionalDependencies(['lib-4000000000', 'lib-3999999999']);"),
        ),
        ("/js/lib/4000000000_big.js", script("")),
    ];
    let result = bundle(&files, "js/1.js");
    assert_eq!(order(&result), vec!["lib-4000000000", ".-0"]);
    assert!(result.text.contains(r#"})("lib", 4000000000, "", "#));
}

#[test]
fn test_direct_file_request() {
    let files = [
        ("/js/main.js", script("_.setLaunchDependencies([0]);")),
        ("/js/0_a.js", script("")),
    ];
    let result = bundle(&files, "js/main.js");
    assert_eq!(order(&result), vec![".-0", "/js/main.js"]);
    assert!(result.text.contains(r#"})(".", undefined, "", "#));
}

#[test]
fn test_literal_decoding() {
    use scriptpack_core::literal::decode;
    use serde_json::json;

    let value = decode(r#"{name: "test", include: ['a*', "b*"], grant: 'none'}"#).unwrap();
    assert_eq!(value["name"], json!("test"));
    assert_eq!(value["include"], json!(["a*", "b*"]));
    assert_eq!(value["grant"], json!("none"));
    assert_eq!(decode(r#"["a", 'b']"#).unwrap(), json!(["a", "b"]));
}

#[test]
fn test_invalid_requests() {
    let bundler = bundler(create_test_fs(&[]));
    assert!(matches!(
        bundler.bundle_path("js/../secret/1.js"),
        Err(BundleError::InvalidRequest { .. })
    ));
    assert!(matches!(
        bundler.bundle_path("js/1.js"),
        Err(BundleError::NothingToBundle { .. })
    ));
}

#[test]
fn test_graph_export() {
    let files = [
        ("/js/0_a.js", script("_.setCompileDependencies([1]);")),
        ("/js/1_b.js", script("")),
    ];
    let set = resolve(&files, "js/*.js");
    assert_eq!(
        set.to_dot(),
        "digraph G {\n\t\".-0 [0x1, 0x0, 0x0]\" -> \".-1 [0x2, 0x1, 0x1]\" [label=\"compile\"]\n\t\".-1 [0x2, 0x1, 0x1]\"\n}"
    );
}

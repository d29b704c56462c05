//! Tests for the PyQt binding copier.

use super::*;
use crate::test_utils::{RecordingTools, utf8_root};
use rstest::{fixture, rstest};
use tempfile::TempDir;

struct BindingTree {
    _temp: TempDir,
    source: Utf8PathBuf,
    lib: Utf8PathBuf,
    resources: Utf8PathBuf,
}

#[fixture]
fn tree() -> BindingTree {
    let temp = TempDir::new().expect("temp dir");
    let root = utf8_root(&temp);
    let source = root.join("external/pyqt6/PyQt6");
    fs::create_dir_all(source.join("QtDesigner")).expect("mkdir");
    fs::create_dir_all(source.join("Qt6/lib")).expect("mkdir");
    fs::create_dir_all(source.join("__pycache__")).expect("mkdir");
    for (name, contents) in [
        ("__init__.py", "from .QtCore import *\n"),
        ("QtCore.abi3.so", "core"),
        ("QtGui.abi3.so", "gui"),
        ("QtDesigner.abi3.so", "designer"),
        ("QtQuick3D.abi3.so", "quick3d"),
        ("QtCore.pyi", "stub"),
        ("py.typed", ""),
        ("pylupdate.py", "tool"),
        ("sip.cpython-39-darwin.so", "sip"),
    ] {
        fs::write(source.join(name), contents).expect("write");
    }

    let out = root.join("out");
    BindingTree {
        source,
        lib: out.join("MacOS/lib/PyQt6"),
        resources: out.join("Resources"),
        _temp: temp,
    }
}

fn run(tree: &BindingTree, tools: &RecordingTools) -> BindingsReport {
    copy_bindings(
        &Toolbox::uniform(tools),
        Arch::Arm64,
        &tree.source,
        &tree.lib,
        &tree.resources,
    )
    .expect("copy should succeed")
}

#[rstest]
#[case::extension_module("QtWidgets.abi3.so", false, true)]
#[case::initializer("__init__.py", false, true)]
#[case::directory("Qt6", true, false)]
#[case::skipped_module("QtDesigner.abi3.so", false, false)]
#[case::skipped_prefix_variant("QtQuickWidgets.abi3.so", false, false)]
#[case::cache("__pycache__", false, false)]
#[case::python_source("pyrcc_main.py", false, false)]
#[case::stub("QtGui.pyi", false, false)]
#[case::type_marker("py.typed", false, false)]
fn inclusion_policy(#[case] name: &str, #[case] is_dir: bool, #[case] included: bool) {
    assert_eq!(include_binding_entry(name, is_dir), included);
}

#[rstest]
fn only_used_modules_are_copied(tree: BindingTree) {
    let tools = RecordingTools::new();
    let report = run(&tree, &tools);

    let mut copied: Vec<_> = sorted_entries(&tree.lib)
        .expect("list")
        .into_iter()
        .map(|e| e.name)
        .collect();
    copied.sort();

    assert_eq!(
        copied,
        [
            "QtCore.abi3.so",
            "QtGui.abi3.so",
            "__init__.py",
            "sip.cpython-39-darwin.so",
        ]
    );
    assert_eq!(report.copied, 4);
    assert_eq!(report.excluded, 8);
    assert_eq!(report.thin.thinned, 3);
    assert_eq!(report.thin.total(), 3);
    assert!(!tree.lib.join("QtDesigner").exists());
}

#[rstest]
fn every_module_is_thinned_before_signing(tree: BindingTree) {
    let tools = RecordingTools::new();
    run(&tree, &tools);

    let signed = tools.signed();
    assert_eq!(signed.len(), 3);
    for path in &signed {
        let thin = tools.thin_index(path).expect("module was thinned");
        let sign = tools.sign_index(path).expect("module was signed");
        assert!(thin < sign, "{path} signed before thinning");
    }
    assert_eq!(tools.thinned(), signed);
}

#[rstest]
fn initializer_is_neither_thinned_nor_signed(tree: BindingTree) {
    let tools = RecordingTools::new();
    run(&tree, &tools);

    let init = tree.lib.join(PACKAGE_INIT);
    assert_eq!(tools.thin_index(&init), None);
    assert_eq!(tools.sign_index(&init), None);
}

#[rstest]
fn initializer_is_relocated_behind_a_relative_link(tree: BindingTree) {
    let tools = RecordingTools::new();
    run(&tree, &tools);

    let init = tree.lib.join(PACKAGE_INIT);
    let relocated = tree.resources.join("pyqt_init.py");

    assert!(relocated.is_file());
    assert!(init.is_symlink());
    assert_eq!(
        fs::read_link(&init).expect("read link"),
        std::path::PathBuf::from("../../../Resources/pyqt_init.py")
    );
    assert_eq!(
        fs::read_to_string(&init).expect("follow link"),
        "from .QtCore import *\n"
    );
}

#[rstest]
fn missing_initializer_fails_before_any_signing(tree: BindingTree) {
    fs::remove_file(tree.source.join(PACKAGE_INIT)).expect("remove init");
    let tools = RecordingTools::new();

    let err = copy_bindings(
        &Toolbox::uniform(&tools),
        Arch::Arm64,
        &tree.source,
        &tree.lib,
        &tree.resources,
    )
    .expect_err("expected failure");

    assert!(matches!(err, BundleError::MissingPackageInit { .. }));
    assert!(tools.ops().is_empty());
}

#[rstest]
#[case("/out/MacOS/lib/PyQt6", "/out/Resources/pyqt_init.py", "../../../Resources/pyqt_init.py")]
#[case("/out/lib", "/out/lib/init.py", "init.py")]
#[case("out/a", "out/b/c.py", "../b/c.py")]
fn relative_paths(#[case] from: &str, #[case] target: &str, #[case] expected: &str) {
    assert_eq!(
        relative_path(Utf8Path::new(from), Utf8Path::new(target)),
        Utf8PathBuf::from(expected)
    );
}

//! Qt framework mirror.
//!
//! Frameworks are mirrored link-for-link into `Frameworks/`, thinned, and
//! signed only after the WebEngine helper application nested inside
//! `QtWebEngineCore.framework` has been signed with its entitlements.

use super::{DirEntry, sorted_entries, starts_with_any};
use crate::arch::Arch;
use crate::error::{BundleError, Result};
use crate::tools::{MirrorRequest, ThinCounts, ThinOutcome, Toolbox};
use camino::Utf8Path;
use log::{debug, trace};

/// Frameworks the application never loads.
pub const SKIP_FRAMEWORK_PREFIXES: &[&str] = &[
    "QtConcurrent",
    "QtDesigner",
    "QtHelp",
    "QtLabs",
    "QtTest",
    "QtUiTools",
    "QtUiPlugin",
    "QtRepParser",
    "QtXml",
];

/// Framework directory entries never bundled.
pub const FRAMEWORK_EXCLUDES: &[&str] = &["Headers"];

/// Location of the WebEngine helper application, relative to `Frameworks/`.
pub const WEBENGINE_HELPER: &str =
    "QtWebEngineCore.framework/Versions/Current/Helpers/QtWebEngineProcess.app";

/// Executable inside the helper application.
const HELPER_EXECUTABLE: &str = "Contents/MacOS/QtWebEngineProcess";

/// Outcome of the framework stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrameworksReport {
    /// Framework bundle names, in the order they were mirrored and signed.
    pub frameworks: Vec<String>,
    /// Thinning outcomes, the helper executable included.
    pub thin: ThinCounts,
}

/// Framework bundles under `lib_dir` that belong in the application.
///
/// # Errors
///
/// Returns an error if `lib_dir` cannot be read.
pub fn allowed_frameworks(lib_dir: &Utf8Path) -> Result<Vec<String>> {
    Ok(sorted_entries(lib_dir)?
        .into_iter()
        .map(|entry| entry.name)
        .filter(|name| {
            name.ends_with(".framework") && !starts_with_any(name, SKIP_FRAMEWORK_PREFIXES)
        })
        .collect())
}

/// Mirror, thin and sign the Qt frameworks into `output_root/Frameworks`.
///
/// # Errors
///
/// Returns `BundleError::MissingHelper` if the mirrored tree lacks the
/// WebEngine helper, or any mirroring, thinning or signing failure.
pub fn mirror_frameworks(
    tools: &Toolbox<'_>,
    qt_bin: &Utf8Path,
    output_root: &Utf8Path,
    arch: Arch,
    helper_entitlements: &Utf8Path,
) -> Result<FrameworksReport> {
    let lib_dir = qt_bin.join("lib");
    let frameworks_dir = output_root.join("Frameworks");
    let mut report = FrameworksReport {
        frameworks: allowed_frameworks(&lib_dir)?,
        thin: ThinCounts::default(),
    };

    for name in &report.frameworks {
        let dest = frameworks_dir.join(name);
        tools.mirror.mirror(&MirrorRequest {
            source: &lib_dir.join(name),
            dest: &dest,
            excludes: FRAMEWORK_EXCLUDES,
        })?;
        thin_framework_binaries(tools, &dest, arch, &mut report.thin)?;
    }

    let helper = sign_helper(tools, &frameworks_dir, arch, helper_entitlements)?;
    report.thin.record(helper);

    for name in &report.frameworks {
        let bundle = frameworks_dir.join(name);
        debug!("signing {bundle}");
        tools.signer.sign(&bundle, None)?;
    }
    Ok(report)
}

/// Thin every `Qt*` file in the framework's current version.
fn thin_framework_binaries(
    tools: &Toolbox<'_>,
    framework: &Utf8Path,
    arch: Arch,
    counts: &mut ThinCounts,
) -> Result<()> {
    let current = framework.join("Versions/Current");
    for DirEntry { name, path, is_dir } in sorted_entries(&current)? {
        if is_dir || !name.starts_with("Qt") {
            trace!("not thinning {path}");
            continue;
        }
        counts.record(tools.thinner.thin(&path, arch)?);
    }
    Ok(())
}

fn sign_helper(
    tools: &Toolbox<'_>,
    frameworks_dir: &Utf8Path,
    arch: Arch,
    entitlements: &Utf8Path,
) -> Result<ThinOutcome> {
    let helper = frameworks_dir.join(WEBENGINE_HELPER);
    if !helper.is_dir() {
        return Err(BundleError::MissingHelper { path: helper });
    }
    let outcome = tools.thinner.thin(&helper.join(HELPER_EXECUTABLE), arch)?;
    tools.signer.sign(&helper, Some(entitlements))?;
    Ok(outcome)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::test_utils::{RecordedOp, RecordingTools, utf8_root};
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use std::fs;
    use std::os::unix::fs::symlink;
    use tempfile::TempDir;

    struct QtInstall {
        _temp: TempDir,
        qt_bin: Utf8PathBuf,
        output: Utf8PathBuf,
        entitlements: Utf8PathBuf,
    }

    fn framework(lib: &Utf8Path, module: &str) -> Utf8PathBuf {
        let bundle = lib.join(format!("{module}.framework"));
        let version = bundle.join("Versions/A");
        fs::create_dir_all(version.join("Headers")).expect("mkdir");
        fs::create_dir_all(version.join("Resources")).expect("mkdir");
        fs::write(version.join(module), module).expect("write");
        fs::write(version.join("Headers/qglobal.h"), "header").expect("write");
        fs::write(version.join("Resources/Info.plist"), "plist").expect("write");
        symlink("A", bundle.join("Versions/Current")).expect("symlink");
        symlink(format!("Versions/Current/{module}"), bundle.join(module)).expect("symlink");
        symlink("Versions/Current/Resources", bundle.join("Resources")).expect("symlink");
        fs::create_dir_all(bundle.join("Headers")).expect("mkdir");
        bundle
    }

    #[fixture]
    fn install() -> QtInstall {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_root(&temp);
        let qt_bin = root.join("qt/6.5.3/macos");
        let lib = qt_bin.join("lib");
        for module in ["QtCore", "QtGui", "QtTest", "QtXml", "QtWebEngineCore"] {
            framework(&lib, module);
        }
        fs::write(lib.join("libQt6Bundled.a"), "static").expect("write");

        let helper = lib.join("QtWebEngineCore.framework/Versions/A/Helpers/QtWebEngineProcess.app");
        fs::create_dir_all(helper.join("Contents/MacOS")).expect("mkdir");
        fs::write(helper.join(HELPER_EXECUTABLE), "helper").expect("write");

        let entitlements = root.join("entitlements.plist");
        fs::write(&entitlements, "<plist/>").expect("write");

        QtInstall {
            qt_bin,
            output: root.join("out"),
            entitlements,
            _temp: temp,
        }
    }

    fn run(install: &QtInstall, tools: &RecordingTools) -> Result<FrameworksReport> {
        mirror_frameworks(
            &Toolbox::uniform(tools),
            &install.qt_bin,
            &install.output,
            Arch::Arm64,
            &install.entitlements,
        )
    }

    #[rstest]
    fn skipped_frameworks_are_not_mirrored(install: QtInstall) {
        let tools = RecordingTools::new();
        let report = run(&install, &tools).expect("frameworks should succeed");

        assert_eq!(
            report.frameworks,
            ["QtCore.framework", "QtGui.framework", "QtWebEngineCore.framework"]
        );
        let mirrored = allowed_frameworks(&install.output.join("Frameworks")).expect("list");
        assert_eq!(mirrored, report.frameworks);
        assert!(!install.output.join("Frameworks/QtTest.framework").exists());
    }

    #[rstest]
    fn headers_are_excluded_and_links_preserved(install: QtInstall) {
        let tools = RecordingTools::new();
        run(&install, &tools).expect("frameworks should succeed");

        let core = install.output.join("Frameworks/QtCore.framework");
        assert!(!core.join("Headers").exists());
        assert!(!core.join("Versions/A/Headers").exists());
        assert_eq!(
            fs::read_link(core.join("Versions/Current")).expect("read link"),
            std::path::PathBuf::from("A")
        );
        assert!(core.join("QtCore").is_symlink());
        assert!(core.join("Versions/A/Resources/Info.plist").is_file());
    }

    #[rstest]
    fn only_current_qt_binaries_are_thinned(install: QtInstall) {
        let tools = RecordingTools::new();
        let report = run(&install, &tools).expect("frameworks should succeed");

        let frameworks = install.output.join("Frameworks");
        assert_eq!(
            tools.thinned(),
            [
                frameworks.join("QtCore.framework/Versions/Current/QtCore"),
                frameworks.join("QtGui.framework/Versions/Current/QtGui"),
                frameworks.join("QtWebEngineCore.framework/Versions/Current/QtWebEngineCore"),
                frameworks.join(WEBENGINE_HELPER).join(HELPER_EXECUTABLE),
            ]
        );
        assert_eq!(report.thin.thinned, 4);
        assert_eq!(report.thin.total(), 4);
    }

    #[rstest]
    fn helper_is_signed_with_entitlements_before_its_framework(install: QtInstall) {
        let tools = RecordingTools::new();
        run(&install, &tools).expect("frameworks should succeed");

        let frameworks = install.output.join("Frameworks");
        let helper = frameworks.join(WEBENGINE_HELPER);
        let core = frameworks.join("QtWebEngineCore.framework");
        let helper_sign = tools.sign_index(&helper).expect("helper was signed");
        let core_sign = tools.sign_index(&core).expect("framework was signed");
        assert!(helper_sign < core_sign);

        let ops = tools.ops();
        assert!(ops.contains(&RecordedOp::Sign {
            path: helper,
            entitlements: Some(install.entitlements.clone()),
        }));
        assert!(ops.contains(&RecordedOp::Sign {
            path: core,
            entitlements: None,
        }));
    }

    #[rstest]
    fn frameworks_are_signed_after_every_thin(install: QtInstall) {
        let tools = RecordingTools::new();
        run(&install, &tools).expect("frameworks should succeed");

        let ops = tools.ops();
        let last_thin = ops
            .iter()
            .rposition(|op| matches!(op, RecordedOp::Thin(_)))
            .expect("something was thinned");
        let first_sign = ops
            .iter()
            .position(|op| matches!(op, RecordedOp::Sign { .. }))
            .expect("something was signed");
        assert!(last_thin < first_sign);
        assert_eq!(tools.signed().len(), 4);
    }

    #[rstest]
    fn missing_helper_is_fatal(install: QtInstall) {
        fs::remove_dir_all(
            install
                .qt_bin
                .join("lib/QtWebEngineCore.framework/Versions/A/Helpers"),
        )
        .expect("remove helper");
        let tools = RecordingTools::new();

        let err = run(&install, &tools).expect_err("expected failure");

        assert!(matches!(err, BundleError::MissingHelper { .. }));
        assert!(tools.signed().is_empty());
    }
}

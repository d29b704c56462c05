//! PyQt binding copier.
//!
//! Copies the compiled PyQt modules the application uses into the bundle's
//! library folder, thinning and signing each one. The package initializer is
//! hoisted out of the signed tree into `Resources/` so it can be replaced
//! without invalidating signatures; a relative symlink keeps `import PyQt6`
//! working.

use super::{DirEntry, copy_with_times, ensure_dir, sorted_entries, starts_with_any};
use crate::arch::Arch;
use crate::error::{BundleError, Result};
use crate::layout::PYQT_INIT_RESOURCE;
use crate::tools::{ThinCounts, Toolbox};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use std::fs;

/// PyQt submodules the application never imports.
pub const SKIP_PYQT_PREFIXES: &[&str] = &[
    "QtDesigner",
    "QtOpenGL",
    "QtOpenGLWidgets",
    "QtPositioning",
    "QtNfc",
    "QtBluetooth",
    "QtHelp",
    "QtQml",
    "QtQuick",
    "QtQuick3D",
    "QtQuickWidgets",
    "QtRemoteObjects",
    "QtSensors",
    "QtSerialPort",
    "QtSql",
    "QtTest",
    "QtWebEngineQuick",
    "QtXml",
    "__pycache__",
];

/// The package initializer.
pub const PACKAGE_INIT: &str = "__init__.py";

/// Counts reported after copying the bindings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BindingsReport {
    /// Entries copied into the library folder.
    pub copied: usize,
    /// Entries excluded by the inclusion policy.
    pub excluded: usize,
    /// Thinning outcomes for the copied modules.
    pub thin: ThinCounts,
}

/// Decide whether a top-level PyQt entry belongs in the bundle.
///
/// Directories, unused submodules, Python sources other than the package
/// initializer, type stubs and the `py.typed` marker are all excluded.
///
/// # Examples
///
/// ```
/// use qt_bundler::stages::bindings::include_binding_entry;
///
/// assert!(include_binding_entry("QtCore.abi3.so", false));
/// assert!(include_binding_entry("__init__.py", false));
/// assert!(!include_binding_entry("QtCore.pyi", false));
/// assert!(!include_binding_entry("Qt6", true));
/// ```
#[must_use]
pub fn include_binding_entry(name: &str, is_dir: bool) -> bool {
    if is_dir || starts_with_any(name, SKIP_PYQT_PREFIXES) {
        return false;
    }
    if name.ends_with(".py") && name != PACKAGE_INIT {
        return false;
    }
    !(name.ends_with(".pyi") || name == "py.typed")
}

/// Copy the PyQt package into `dest_lib`, thinning and signing each module,
/// then relocate the initializer to `dest_resources`.
///
/// # Errors
///
/// Returns `BundleError::MissingPackageInit` if the source has no
/// `__init__.py`, or any I/O, thinning or signing failure.
pub fn copy_bindings(
    tools: &Toolbox<'_>,
    arch: Arch,
    source_tree: &Utf8Path,
    dest_lib: &Utf8Path,
    dest_resources: &Utf8Path,
) -> Result<BindingsReport> {
    let source_init = source_tree.join(PACKAGE_INIT);
    if !source_init.is_file() {
        return Err(BundleError::MissingPackageInit { path: source_init });
    }

    let mut report = BindingsReport::default();
    for DirEntry { name, path, is_dir } in sorted_entries(source_tree)? {
        if !include_binding_entry(&name, is_dir) {
            trace!("skipping {path}");
            report.excluded += 1;
            continue;
        }

        let dest = dest_lib.join(&name);
        ensure_dir(dest_lib)?;
        copy_with_times(&path, &dest)?;
        report.copied += 1;

        if name != PACKAGE_INIT {
            report.thin.record(tools.thin_and_sign(&dest, arch)?);
        }
    }

    hoist_package_init(dest_lib, dest_resources)?;
    Ok(report)
}

/// Move the copied initializer into resources and leave a relative link.
fn hoist_package_init(dest_lib: &Utf8Path, dest_resources: &Utf8Path) -> Result<()> {
    let init_in_lib = dest_lib.join(PACKAGE_INIT);
    let relocated = dest_resources.join(PYQT_INIT_RESOURCE);

    ensure_dir(dest_resources)?;
    move_file(&init_in_lib, &relocated)?;

    let link_target = relative_path(dest_lib, &relocated);
    symlink(&link_target, &init_in_lib)?;
    debug!("linked {init_in_lib} -> {link_target}");
    Ok(())
}

/// Rename, falling back to copy and delete across filesystems.
fn move_file(src: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    if fs::rename(src, dest).is_err() {
        copy_with_times(src, dest)?;
        fs::remove_file(src)?;
    }
    Ok(())
}

/// Path to `target` relative to the directory `from_dir`.
///
/// Both paths must be expressed against the same base (both absolute, or
/// both relative to the same directory).
fn relative_path(from_dir: &Utf8Path, target: &Utf8Path) -> Utf8PathBuf {
    let from: Vec<_> = from_dir.components().collect();
    let to: Vec<_> = target.components().collect();
    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut relative = Utf8PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in to.iter().skip(common) {
        relative.push(component.as_str());
    }
    relative
}

#[cfg(unix)]
fn symlink(original: &Utf8Path, link: &Utf8Path) -> Result<()> {
    std::os::unix::fs::symlink(original, link)?;
    Ok(())
}

#[cfg(windows)]
fn symlink(original: &Utf8Path, link: &Utf8Path) -> Result<()> {
    std::os::windows::fs::symlink_file(original, link)?;
    Ok(())
}

#[cfg(test)]
#[path = "bindings_tests.rs"]
mod tests;

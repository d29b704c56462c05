//! Qt plugin mirror.
//!
//! The whole plugin directory is mirrored next to the PyQt package, minus
//! the plugin families that are never loaded at runtime, and every plugin
//! library is then thinned and signed.

use super::{ensure_dir, utf8_path};
use crate::arch::Arch;
use crate::error::Result;
use crate::layout::QtMajor;
use crate::tools::{MirrorRequest, ThinCounts, Toolbox};
use camino::{Utf8Path, Utf8PathBuf};
use walkdir::WalkDir;

/// Plugin directories left out of the bundle.
pub const EXCLUDED_PLUGIN_DIRS: &[&str] = &["sqldrivers", "qmltooling", "designer"];

/// Outcome of the plugin stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginsReport {
    /// Plugin libraries that were signed, in processing order.
    pub libraries: Vec<Utf8PathBuf>,
    /// Thinning outcomes for those libraries.
    pub thin: ThinCounts,
}

/// Mirror `qt_bin/plugins` into the PyQt package and thin and sign every
/// plugin library.
///
/// # Errors
///
/// Returns an error if mirroring, walking, thinning or signing fails.
pub fn mirror_plugins(
    tools: &Toolbox<'_>,
    qt_bin: &Utf8Path,
    dest_lib: &Utf8Path,
    major: QtMajor,
    arch: Arch,
) -> Result<PluginsReport> {
    let source = qt_bin.join("plugins");
    let dest = dest_lib.join(major.plugin_subpath());
    ensure_dir(&dest)?;

    tools.mirror.mirror(&MirrorRequest {
        source: &source,
        dest: &dest,
        excludes: EXCLUDED_PLUGIN_DIRS,
    })?;

    let mut report = PluginsReport {
        libraries: plugin_libraries(&dest)?,
        thin: ThinCounts::default(),
    };
    for library in &report.libraries {
        report.thin.record(tools.thin_and_sign(library, arch)?);
    }
    Ok(report)
}

/// Every regular `.dylib` file below `dir`, in sorted walk order.
///
/// Symlinks are not followed and symlinked libraries are not returned.
fn plugin_libraries(dir: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let mut libraries = Vec::new();
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry?;
        let is_dylib = entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(".dylib"));
        if entry.file_type().is_file() && is_dylib {
            libraries.push(utf8_path(entry.path())?);
        }
    }
    Ok(libraries)
}

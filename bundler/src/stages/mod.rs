//! Pipeline stages, run by the driver in this order:
//!
//! 1. [`bindings`] - copy, thin and sign the PyQt package
//! 2. [`translations`] - copy the base Qt translations
//! 3. [`plugins`] - mirror, thin and sign the Qt plugins
//! 4. [`frameworks`] - mirror, thin and sign the Qt frameworks
//!
//! Each stage finishes every thin and sign it performs before returning.
//! Within a stage a file is always thinned before it is signed, and nested
//! bundles are signed before the bundles that contain them.

pub mod bindings;
pub mod frameworks;
pub mod plugins;
pub mod translations;

use crate::error::{BundleError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

/// Returns true if `name` starts with any of `prefixes`.
///
/// # Examples
///
/// ```
/// use qt_bundler::stages::starts_with_any;
///
/// assert!(starts_with_any("QtQuick3D.abi3.so", &["QtQuick"]));
/// assert!(!starts_with_any("QtCore.abi3.so", &["QtQuick"]));
/// ```
#[must_use]
pub fn starts_with_any(name: &str, prefixes: &[&str]) -> bool {
    prefixes.iter().any(|prefix| name.starts_with(prefix))
}

/// A direct child of a directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DirEntry {
    pub(crate) name: String,
    pub(crate) path: Utf8PathBuf,
    /// Whether the entry is a directory, following symlinks.
    pub(crate) is_dir: bool,
}

/// List the direct children of `dir`, sorted by name.
pub(crate) fn sorted_entries(dir: &Utf8Path) -> Result<Vec<DirEntry>> {
    let mut entries = Vec::new();
    for entry in dir.read_dir_utf8()? {
        let entry = entry?;
        let path = entry.path().to_owned();
        entries.push(DirEntry {
            name: entry.file_name().to_owned(),
            is_dir: path.is_dir(),
            path,
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Convert a path produced by a directory walk to UTF-8.
pub(crate) fn utf8_path(path: &std::path::Path) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path.to_path_buf()).map_err(|path| BundleError::NonUtf8Path { path })
}

/// Copy a file, preserving permissions and modification time.
pub(crate) fn copy_with_times(src: &Utf8Path, dest: &Utf8Path) -> Result<()> {
    fs::copy(src, dest)?;
    let modified = fs::metadata(src)?.modified()?;
    fs::File::options().write(true).open(dest)?.set_modified(modified)?;
    Ok(())
}

/// Create `dir` and any missing parents.
pub(crate) fn ensure_dir(dir: &Utf8Path) -> Result<()> {
    fs::create_dir_all(dir)?;
    Ok(())
}

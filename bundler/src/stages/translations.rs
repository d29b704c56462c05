//! Qt translation copier.
//!
//! Only the `qtbase` catalogues are bundled; module-specific translations are
//! left behind to keep the bundle small.

use super::{copy_with_times, ensure_dir, sorted_entries};
use camino::Utf8Path;
use log::trace;

use crate::error::Result;

/// Prefix of the translation catalogues that are bundled.
pub const TRANSLATION_PREFIX: &str = "qtbase";

/// Directory under `Resources/` receiving the catalogues.
pub const TRANSLATIONS_DIR: &str = "qt_translations";

/// Copy the base translation catalogues from `qt_bin/translations`.
///
/// Returns the number of files copied.
///
/// # Errors
///
/// Returns an error if the source directory cannot be read or a copy fails.
pub fn copy_translations(qt_bin: &Utf8Path, dest_resources: &Utf8Path) -> Result<usize> {
    let source = qt_bin.join("translations");
    let dest = dest_resources.join(TRANSLATIONS_DIR);
    ensure_dir(&dest)?;

    let mut copied = 0;
    for entry in sorted_entries(&source)? {
        if entry.name.starts_with(TRANSLATION_PREFIX) {
            copy_with_times(&entry.path, &dest.join(&entry.name))?;
            copied += 1;
        } else {
            trace!("skipping translation {}", entry.name);
        }
    }
    Ok(copied)
}

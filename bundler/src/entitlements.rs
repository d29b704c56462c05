//! Entitlements granted to the WebEngine helper application.
//!
//! The property list ships inside the binary and is written to a temporary
//! file for `codesign`, which only accepts entitlements by path.

use crate::error::{BundleError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;
use tempfile::NamedTempFile;

/// JIT, unsigned executable memory and disabled library validation, as
/// Chromium's renderer requires under the hardened runtime.
pub const WEBENGINE_HELPER_ENTITLEMENTS: &str =
    include_str!("../entitlements/qtwebengineprocess.plist");

/// An entitlements file on disk, removed when dropped.
#[derive(Debug)]
pub struct EntitlementsFile {
    _file: NamedTempFile,
    path: Utf8PathBuf,
}

impl EntitlementsFile {
    /// Write the WebEngine helper entitlements to a fresh temporary file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written, or if the
    /// temporary directory path is not valid UTF-8.
    pub fn webengine_helper() -> Result<Self> {
        Self::write(WEBENGINE_HELPER_ENTITLEMENTS)
    }

    /// Write `contents` to a fresh temporary file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created or written, or if the
    /// temporary directory path is not valid UTF-8.
    pub fn write(contents: &str) -> Result<Self> {
        let mut file = tempfile::Builder::new()
            .prefix("entitlements")
            .suffix(".plist")
            .tempfile()?;
        file.write_all(contents.as_bytes())?;
        file.flush()?;

        let path = Utf8PathBuf::from_path_buf(file.path().to_path_buf())
            .map_err(|path| BundleError::NonUtf8Path { path })?;
        Ok(Self { _file: file, path })
    }

    /// Location of the file while `self` is alive.
    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

//! Architecture thinning via `lipo`.

use super::{ThinOutcome, Thinner};
use crate::arch::Arch;
use crate::command::CommandExecutor;
use crate::error::{BundleError, Result};
use crate::layout::QtMajor;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;
use std::fs;

/// Diagnostic `lipo` prints when asked to thin a single-architecture file.
const ALREADY_THIN_DIAGNOSTIC: &str = "must be a fat file";

/// Thins binaries in place with `lipo -thin`.
pub struct Lipo<'a> {
    executor: &'a dyn CommandExecutor,
    major: QtMajor,
}

impl<'a> Lipo<'a> {
    /// Create a thinner for a distribution of the given major version.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, major: QtMajor) -> Self {
        Self { executor, major }
    }
}

impl Thinner for Lipo<'_> {
    fn thin(&self, path: &Utf8Path, arch: Arch) -> Result<ThinOutcome> {
        if !self.major.ships_universal_binaries() {
            return Ok(ThinOutcome::Skipped);
        }

        let tmp = temp_output_path(path);
        let output = self.executor.run(
            "lipo",
            &[
                path.as_str(),
                "-thin",
                arch.lipo_name(),
                "-output",
                tmp.as_str(),
            ],
        )?;

        if output.status.success() {
            fs::rename(&tmp, path)?;
            debug!("thinned {path} to {arch}");
            return Ok(ThinOutcome::Thinned);
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        if stderr.contains(ALREADY_THIN_DIAGNOSTIC) {
            debug!("{path} is already single-architecture");
            Ok(ThinOutcome::AlreadyThin)
        } else {
            Err(BundleError::ToolFailed {
                tool: "lipo",
                message: stderr.trim().to_owned(),
            })
        }
    }
}

/// `<path>.tmp`, the scratch file `lipo` writes the slice to.
fn temp_output_path(path: &Utf8Path) -> Utf8PathBuf {
    Utf8PathBuf::from(format!("{path}.tmp"))
}

//! Error types for the Qt bundle preparation pipeline.
//!
//! Every failure is fatal to the run. Variants carry enough context for the
//! operator to fix the build environment and rerun from scratch.

use camino::Utf8PathBuf;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while preparing the Qt bundle.
#[derive(Debug, Error)]
pub enum BundleError {
    /// An external tool exited unsuccessfully or produced unusable output.
    #[error("{tool} failed: {message}")]
    ToolFailed {
        /// Name of the tool that failed (lipo, codesign, rsync, bazel).
        tool: &'static str,
        /// Captured diagnostic output from the tool.
        message: String,
    },

    /// Required host tools are not available on `PATH`.
    #[error("missing required host tools: {}", tools.join(", "))]
    MissingTools {
        /// Names of the tools that could not be found.
        tools: Vec<String>,
    },

    /// An architecture override could not be parsed.
    #[error("unsupported architecture {value}; expected arm64 or x86_64")]
    UnsupportedArch {
        /// The rejected value.
        value: String,
    },

    /// The Qt root path does not name a usable Qt installation.
    #[error("invalid Qt root {path}: {reason}")]
    InvalidQtRoot {
        /// The Qt root that was given.
        path: Utf8PathBuf,
        /// Description of the problem.
        reason: String,
    },

    /// The PyQt distribution has no top-level package initializer.
    #[error("PyQt package initializer not found at {path}")]
    MissingPackageInit {
        /// Where the initializer was expected.
        path: Utf8PathBuf,
    },

    /// The WebEngine helper application is not where the frameworks are
    /// expected to ship it.
    #[error("QtWebEngineProcess helper not found at {path}; has the Qt packaging changed?")]
    MissingHelper {
        /// Where the helper bundle was expected.
        path: Utf8PathBuf,
    },

    /// A path encountered while walking a tree is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", path.display())]
    NonUtf8Path {
        /// The offending path.
        path: PathBuf,
    },

    /// An I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Test stub received an unexpected or mismatched command invocation.
    #[cfg(any(test, feature = "test-support"))]
    #[error("stub mismatch: {message}")]
    StubMismatch {
        /// Description of what was expected versus what was received.
        message: String,
    },
}

impl BundleError {
    /// Build a [`BundleError::ToolFailed`] from a tool's captured stderr.
    #[must_use]
    pub fn tool_failed(tool: &'static str, stderr: &[u8]) -> Self {
        Self::ToolFailed {
            tool,
            message: String::from_utf8_lossy(stderr).trim().to_owned(),
        }
    }
}

impl From<walkdir::Error> for BundleError {
    fn from(err: walkdir::Error) -> Self {
        Self::Io(err.into())
    }
}

/// Result type alias using [`BundleError`].
pub type Result<T> = std::result::Result<T, BundleError>;

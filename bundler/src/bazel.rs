//! Locating the downloaded PyQt distribution.
//!
//! PyQt is fetched by bazel as an external repository. Querying the
//! repository forces the download, after which its files live under the
//! shared `output_base`.

use crate::command::{CommandExecutor, require_success};
use crate::error::{BundleError, Result};
use crate::layout::QtMajor;
use camino::{Utf8Path, Utf8PathBuf};
use log::debug;

/// Resolves the on-disk PyQt package tree.
pub trait BindingLocator {
    /// Return the PyQt package folder for the given Qt major version.
    ///
    /// # Errors
    ///
    /// Returns an error if the distribution cannot be materialised or found.
    fn locate(&self, major: QtMajor) -> Result<Utf8PathBuf>;
}

/// Finds PyQt through `bazel query` and `bazel info output_base`.
pub struct BazelLocator<'a> {
    executor: &'a dyn CommandExecutor,
    repo_root: Utf8PathBuf,
}

impl<'a> BazelLocator<'a> {
    /// Create a locator running bazel from the given workspace root.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor, repo_root: &Utf8Path) -> Self {
        Self {
            executor,
            repo_root: repo_root.to_owned(),
        }
    }

    fn output_base(&self) -> Result<Utf8PathBuf> {
        let output = require_success(
            "bazel",
            self.executor
                .run_in(&self.repo_root, "bazel", &["info", "output_base"])?,
        )?;

        let base = String::from_utf8(output.stdout).map_err(|_| BundleError::ToolFailed {
            tool: "bazel",
            message: "output_base is not valid UTF-8".to_owned(),
        })?;
        let base = base.trim();
        if base.is_empty() {
            return Err(BundleError::ToolFailed {
                tool: "bazel",
                message: "output_base was empty".to_owned(),
            });
        }
        Ok(Utf8PathBuf::from(base))
    }
}

impl BindingLocator for BazelLocator<'_> {
    fn locate(&self, major: QtMajor) -> Result<Utf8PathBuf> {
        let repository = major.pyqt_repository();
        let selector = format!("@{repository}//:*");
        require_success(
            "bazel",
            self.executor
                .run_in(&self.repo_root, "bazel", &["query", &selector])?,
        )?;

        let path = self
            .output_base()?
            .join("external")
            .join(repository)
            .join(major.pyqt_folder_name());
        debug!("PyQt for {major} located at {path}");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
    use rstest::rstest;
    use std::process::Output;

    fn stdout_output(stdout: &str) -> Output {
        let mut output = success_output();
        output.stdout = stdout.as_bytes().to_vec();
        output
    }

    #[rstest]
    #[case(QtMajor::Qt6, "@pyqt6//:*", "/cache/base/external/pyqt6/PyQt6")]
    #[case(QtMajor::Qt5, "@pyqt514//:*", "/cache/base/external/pyqt514/PyQt5")]
    fn locates_repository_under_output_base(
        #[case] major: QtMajor,
        #[case] selector: &str,
        #[case] expected: &str,
    ) {
        let executor = StubExecutor::new(vec![
            ExpectedCall::new("bazel", &["query", selector], Ok(stdout_output("//:BUILD\n")))
                .in_dir("/src/anki"),
            ExpectedCall::new("bazel", &["info", "output_base"], Ok(stdout_output("/cache/base\n")))
                .in_dir("/src/anki"),
        ]);

        let path = BazelLocator::new(&executor, Utf8Path::new("/src/anki"))
            .locate(major)
            .expect("locate should succeed");

        assert_eq!(path, Utf8PathBuf::from(expected));
        executor.assert_finished();
    }

    #[test]
    fn failed_query_is_fatal() {
        let executor = StubExecutor::new(vec![
            ExpectedCall::new(
                "bazel",
                &["query", "@pyqt6//:*"],
                Ok(failure_output("ERROR: no such package '@pyqt6//'")),
            )
            .in_dir("/src/anki"),
        ]);

        let err = BazelLocator::new(&executor, Utf8Path::new("/src/anki"))
            .locate(QtMajor::Qt6)
            .expect_err("expected failure");

        assert!(matches!(err, BundleError::ToolFailed { tool: "bazel", .. }));
        executor.assert_finished();
    }

    #[test]
    fn empty_output_base_is_rejected() {
        let executor = StubExecutor::new(vec![
            ExpectedCall::new("bazel", &["query", "@pyqt6//:*"], Ok(success_output()))
                .in_dir("/src/anki"),
            ExpectedCall::new("bazel", &["info", "output_base"], Ok(stdout_output("\n")))
                .in_dir("/src/anki"),
        ]);

        let err = BazelLocator::new(&executor, Utf8Path::new("/src/anki"))
            .locate(QtMajor::Qt6)
            .expect_err("expected failure");

        assert!(err.to_string().contains("output_base was empty"));
    }
}

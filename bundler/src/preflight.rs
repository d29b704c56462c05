//! Host tool checks run before any output is touched.

use crate::error::{BundleError, Result};
use crate::layout::QtMajor;
use log::debug;

/// Host tools a run of the given Qt major version invokes.
///
/// # Examples
///
/// ```
/// use qt_bundler::layout::QtMajor;
/// use qt_bundler::preflight::required_tools;
///
/// assert!(required_tools(QtMajor::Qt6).contains(&"lipo"));
/// assert!(!required_tools(QtMajor::Qt5).contains(&"lipo"));
/// ```
#[must_use]
pub fn required_tools(major: QtMajor) -> Vec<&'static str> {
    let mut tools = vec!["rsync", "codesign", "bazel"];
    if major.ships_universal_binaries() {
        tools.push("lipo");
    }
    tools
}

/// Resolve every tool on `PATH`.
///
/// # Errors
///
/// Returns `BundleError::MissingTools` listing every tool that could not be
/// found.
pub fn check_required_tools(tools: &[&str]) -> Result<()> {
    check_with(tools, |tool| which::which(tool).is_ok())
}

fn check_with(tools: &[&str], is_available: impl Fn(&str) -> bool) -> Result<()> {
    let missing: Vec<String> = tools
        .iter()
        .filter(|tool| {
            let found = is_available(tool);
            debug!("{tool}: {}", if found { "found" } else { "missing" });
            !found
        })
        .map(|tool| (*tool).to_owned())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(BundleError::MissingTools { tools: missing })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(QtMajor::Qt6, &["rsync", "codesign", "bazel", "lipo"])]
    #[case(QtMajor::Qt5, &["rsync", "codesign", "bazel"])]
    fn tools_per_major(#[case] major: QtMajor, #[case] expected: &[&str]) {
        assert_eq!(required_tools(major), expected);
    }

    #[test]
    fn every_missing_tool_is_reported() {
        let err = check_with(&["rsync", "codesign", "bazel"], |tool| tool == "rsync")
            .expect_err("expected missing tools");

        match err {
            BundleError::MissingTools { tools } => assert_eq!(tools, ["codesign", "bazel"]),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn all_present_passes() {
        assert!(check_with(&["rsync"], |_| true).is_ok());
    }

    #[test]
    fn absent_binary_is_not_found_on_path() {
        let err = check_required_tools(&["qt-bundler-no-such-tool"]).expect_err("missing");
        assert!(err.to_string().contains("qt-bundler-no-such-tool"));
    }
}

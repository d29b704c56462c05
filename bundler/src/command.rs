//! External command execution.
//!
//! Every external tool the pipeline drives (lipo, codesign, rsync, bazel) is
//! invoked through [`CommandExecutor`] so the adapters can be exercised
//! against scripted results instead of the real binaries.

use crate::error::{BundleError, Result};
use camino::Utf8Path;
use log::trace;
use std::process::{Command, Output};

/// Abstraction for running external commands.
pub trait CommandExecutor {
    /// Runs a command with arguments and returns the captured output.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use qt_bundler::command::{CommandExecutor, SystemCommandExecutor};
    ///
    /// let executor = SystemCommandExecutor;
    /// let output = executor.run("rsync", &["--version"])?;
    /// assert!(output.status.success());
    /// # Ok::<(), qt_bundler::error::BundleError>(())
    /// ```
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output>;

    /// Runs a command from the given working directory.
    ///
    /// # Errors
    ///
    /// Returns any I/O errors encountered while spawning or running the command.
    fn run_in(&self, dir: &Utf8Path, cmd: &str, args: &[&str]) -> Result<Output>;
}

/// Executes commands on the host system.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemCommandExecutor;

impl CommandExecutor for SystemCommandExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        trace!("running {cmd} {}", args.join(" "));
        Command::new(cmd)
            .args(args)
            .output()
            .map_err(BundleError::from)
    }

    fn run_in(&self, dir: &Utf8Path, cmd: &str, args: &[&str]) -> Result<Output> {
        trace!("running {cmd} {} in {dir}", args.join(" "));
        Command::new(cmd)
            .args(args)
            .current_dir(dir.as_std_path())
            .output()
            .map_err(BundleError::from)
    }
}

/// Converts a non-zero exit into [`BundleError::ToolFailed`].
///
/// # Errors
///
/// Returns `BundleError::ToolFailed` carrying the tool's stderr when the
/// command did not exit successfully.
pub fn require_success(tool: &'static str, output: Output) -> Result<Output> {
    if output.status.success() {
        Ok(output)
    } else {
        Err(BundleError::tool_failed(tool, &output.stderr))
    }
}

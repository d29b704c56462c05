//! Bundle preparation pipeline orchestration.
//!
//! [`run`] rebuilds the output tree from scratch: the previous tree is
//! removed, the PyQt bindings are located, and the stages run strictly in
//! order. Any failure aborts the run and leaves the partial tree behind for
//! inspection; rerunning starts over.

use crate::bazel::BindingLocator;
use crate::error::Result;
use crate::layout::BundleContext;
use crate::output::{plural, write_stderr_line};
use crate::stages::bindings::{BindingsReport, copy_bindings};
use crate::stages::frameworks::{FrameworksReport, mirror_frameworks};
use crate::stages::plugins::{PluginsReport, mirror_plugins};
use crate::stages::translations::copy_translations;
use crate::tools::{ThinCounts, Toolbox};
use camino::Utf8Path;
use log::debug;
use std::fs;
use std::io::Write;

/// What a successful run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineReport {
    /// Binding copier counts.
    pub bindings: BindingsReport,
    /// Translation catalogues copied.
    pub translations: usize,
    /// Plugin mirror outcome.
    pub plugins: PluginsReport,
    /// Framework mirror outcome.
    pub frameworks: FrameworksReport,
}

impl PipelineReport {
    /// Thinning outcomes summed over every stage.
    #[must_use]
    pub fn thin(&self) -> ThinCounts {
        self.bindings.thin + self.plugins.thin + self.frameworks.thin
    }
}

/// Remove `root` if present and recreate it empty.
///
/// # Errors
///
/// Returns an error if the old tree cannot be removed or the new directory
/// cannot be created.
pub fn reset_output(root: &Utf8Path) -> Result<()> {
    if fs::symlink_metadata(root).is_ok() {
        debug!("removing previous output at {root}");
        fs::remove_dir_all(root)?;
    }
    fs::create_dir_all(root)?;
    Ok(())
}

/// Run every stage against `context`.
///
/// Progress is written to `stderr` as each stage starts.
///
/// # Errors
///
/// Returns the first error raised by output reset, binding location or any
/// stage.
pub fn run(
    context: &BundleContext,
    tools: &Toolbox<'_>,
    locator: &dyn BindingLocator,
    stderr: &mut dyn Write,
) -> Result<PipelineReport> {
    let output = &context.output;
    let qt_bin = context.qt.bin_dir();
    let major = context.major();

    write_stderr_line(
        stderr,
        format!("Preparing {major} for {} in {}...", context.arch, output.root()),
    );
    reset_output(output.root())?;
    fs::create_dir_all(output.resources())?;

    write_stderr_line(stderr, format!("Locating {} bindings...", major.pyqt_folder_name()));
    let source_tree = locator.locate(major)?;

    write_stderr_line(stderr, format!("Copying bindings from {source_tree}..."));
    let bindings = copy_bindings(
        tools,
        context.arch,
        &source_tree,
        &output.pyqt_lib(),
        &output.resources(),
    )?;

    write_stderr_line(stderr, "Copying translations...");
    let translations = copy_translations(&qt_bin, &output.resources())?;

    write_stderr_line(stderr, "Mirroring plugins...");
    let plugins = mirror_plugins(tools, &qt_bin, &output.pyqt_lib(), major, context.arch)?;
    write_stderr_line(
        stderr,
        format!("  {}", plural(plugins.libraries.len(), "plugin", "plugins")),
    );

    write_stderr_line(stderr, "Mirroring frameworks...");
    let frameworks = mirror_frameworks(
        tools,
        &qt_bin,
        output.root(),
        context.arch,
        &context.helper_entitlements,
    )?;

    Ok(PipelineReport {
        bindings,
        translations,
        plugins,
        frameworks,
    })
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;

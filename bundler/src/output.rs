//! Progress and summary lines for the command-line tools.
//!
//! Everything user-facing goes through [`write_stderr_line`] so the binaries
//! can be exercised against an in-memory buffer.

use crate::pipeline::PipelineReport;
use crate::tools::ThinCounts;
use camino::Utf8Path;
use std::io::Write;

/// Write one line, ignoring failures.
pub fn write_stderr_line(stderr: &mut dyn Write, message: impl std::fmt::Display) {
    if writeln!(stderr, "{message}").is_err() {
        // Best-effort logging; ignore write failures.
    }
}

/// Format a count with its singular or plural noun.
///
/// # Examples
///
/// ```
/// use qt_bundler::output::plural;
///
/// assert_eq!(plural(1, "plugin", "plugins"), "1 plugin");
/// assert_eq!(plural(3, "plugin", "plugins"), "3 plugins");
/// ```
#[must_use]
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    let noun = if count == 1 { singular } else { plural };
    format!("{count} {noun}")
}

/// Format the line printed after a successful run.
#[must_use]
pub fn success_message(report: &PipelineReport, output_root: &Utf8Path) -> String {
    format!(
        "Prepared {} ({} excluded), {}, {} and {} in {output_root}",
        plural(report.bindings.copied, "binding", "bindings"),
        report.bindings.excluded,
        plural(report.translations, "translation", "translations"),
        plural(report.plugins.libraries.len(), "plugin", "plugins"),
        plural(report.frameworks.frameworks.len(), "framework", "frameworks"),
    )
}

/// Format the thinning tally printed after a successful run.
///
/// # Examples
///
/// ```
/// use qt_bundler::output::thin_summary;
/// use qt_bundler::tools::ThinCounts;
///
/// let counts = ThinCounts { thinned: 4, already_thin: 1, skipped: 0 };
/// assert_eq!(thin_summary(counts), "Thinned 4 binaries, 1 already single-architecture");
/// ```
#[must_use]
pub fn thin_summary(counts: ThinCounts) -> String {
    let mut parts = vec![format!("Thinned {}", plural(counts.thinned, "binary", "binaries"))];
    if counts.already_thin > 0 {
        parts.push(format!("{} already single-architecture", counts.already_thin));
    }
    if counts.skipped > 0 {
        parts.push(format!("{} skipped", counts.skipped));
    }
    parts.join(", ")
}

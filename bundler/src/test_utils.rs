//! Shared test doubles for the bundler crate.
//!
//! [`StubExecutor`] scripts the results of individual command invocations
//! for adapter tests. [`RecordingTools`] stands in for the whole toolbox in
//! stage tests: it records every mirror, thin and sign in order and performs
//! mirrors on the local filesystem so later stages see real trees.

use crate::arch::Arch;
use crate::bazel::BindingLocator;
use crate::command::CommandExecutor;
use crate::error::{BundleError, Result};
use crate::layout::QtMajor;
use crate::tools::{Mirror, MirrorRequest, Signer, ThinOutcome, Thinner};
use camino::{Utf8Path, Utf8PathBuf};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::process::{ExitStatus, Output};
use tempfile::TempDir;
use walkdir::WalkDir;

/// Creates an `ExitStatus` from an exit code (Unix implementation).
#[cfg(unix)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::unix::process::ExitStatusExt;

    ExitStatus::from_raw(code << 8)
}

/// Creates an `ExitStatus` from an exit code (Windows implementation).
#[cfg(windows)]
#[must_use]
pub fn exit_status(code: i32) -> ExitStatus {
    use std::os::windows::process::ExitStatusExt;

    ExitStatus::from_raw(code as u32)
}

/// Creates a successful command `Output` with empty stdout and stderr.
#[must_use]
pub fn success_output() -> Output {
    Output {
        status: exit_status(0),
        stdout: Vec::new(),
        stderr: Vec::new(),
    }
}

/// Creates a failed command `Output` with the given stderr message.
#[must_use]
pub fn failure_output(stderr: &str) -> Output {
    Output {
        status: exit_status(1),
        stdout: Vec::new(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// Returns the UTF-8 path of a temporary directory.
///
/// # Panics
///
/// Panics if the temporary directory path is not valid UTF-8.
#[must_use]
pub fn utf8_root(temp: &TempDir) -> Utf8PathBuf {
    Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("temp dir path not UTF-8")
}

/// Represents an expected command invocation for testing.
#[derive(Debug)]
pub struct ExpectedCall {
    /// The command to execute (e.g., "lipo").
    pub cmd: &'static str,
    /// The arguments to pass to the command.
    pub args: Vec<String>,
    /// The working directory, when the command must run from one.
    pub dir: Option<Utf8PathBuf>,
    /// The result to return when this command is invoked.
    pub result: Result<Output>,
}

impl ExpectedCall {
    /// Expect `cmd` with `args`, returning `result`.
    #[must_use]
    pub fn new(cmd: &'static str, args: &[&str], result: Result<Output>) -> Self {
        Self {
            cmd,
            args: args.iter().map(|arg| (*arg).to_owned()).collect(),
            dir: None,
            result,
        }
    }

    /// Require the call to run from `dir`.
    #[must_use]
    pub fn in_dir(mut self, dir: impl Into<Utf8PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }
}

/// A stub implementation of `CommandExecutor` for testing.
///
/// Records expected command invocations and returns predefined results,
/// allowing tests to verify command execution without side effects.
#[derive(Debug)]
pub struct StubExecutor {
    expected: RefCell<VecDeque<ExpectedCall>>,
}

impl StubExecutor {
    /// Creates a new `StubExecutor` with the given expected calls.
    #[must_use]
    pub fn new(expected: Vec<ExpectedCall>) -> Self {
        Self {
            expected: RefCell::new(expected.into()),
        }
    }

    /// Asserts that all expected command invocations have been consumed.
    ///
    /// # Panics
    ///
    /// Panics if there are remaining expected calls that were not invoked.
    pub fn assert_finished(&self) {
        assert!(
            self.expected.borrow().is_empty(),
            "expected no further command invocations"
        );
    }

    fn take(&self, dir: Option<&Utf8Path>, cmd: &str, args: &[&str]) -> Result<Output> {
        let call = self
            .expected
            .borrow_mut()
            .pop_front()
            .ok_or_else(|| BundleError::StubMismatch {
                message: format!("unexpected invocation: {cmd} {}", args.join(" ")),
            })?;

        assert_eq!(call.cmd, cmd);
        assert_eq!(call.args, args);
        assert_eq!(call.dir.as_deref(), dir);

        call.result
    }
}

impl CommandExecutor for StubExecutor {
    fn run(&self, cmd: &str, args: &[&str]) -> Result<Output> {
        self.take(None, cmd, args)
    }

    fn run_in(&self, dir: &Utf8Path, cmd: &str, args: &[&str]) -> Result<Output> {
        self.take(Some(dir), cmd, args)
    }
}

/// One operation observed by [`RecordingTools`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedOp {
    /// A directory mirror.
    Mirror {
        /// Mirrored directory.
        source: Utf8PathBuf,
        /// Receiving directory.
        dest: Utf8PathBuf,
    },
    /// A thinning of the given file.
    Thin(Utf8PathBuf),
    /// A signing of the given file or bundle.
    Sign {
        /// Signed path.
        path: Utf8PathBuf,
        /// Entitlements file, if one was attached.
        entitlements: Option<Utf8PathBuf>,
    },
}

/// Toolbox double that records operations and mirrors on the local disk.
///
/// Thinning and signing leave files untouched but fail when the target does
/// not exist, so structural mistakes surface as they would with the real
/// tools.
#[derive(Debug, Default)]
pub struct RecordingTools {
    ops: RefCell<Vec<RecordedOp>>,
}

impl RecordingTools {
    /// Create a toolbox double with an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every recorded operation, in order.
    #[must_use]
    pub fn ops(&self) -> Vec<RecordedOp> {
        self.ops.borrow().clone()
    }

    /// Paths that were thinned, in order.
    #[must_use]
    pub fn thinned(&self) -> Vec<Utf8PathBuf> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Thin(path) => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Paths that were signed, in order.
    #[must_use]
    pub fn signed(&self) -> Vec<Utf8PathBuf> {
        self.ops
            .borrow()
            .iter()
            .filter_map(|op| match op {
                RecordedOp::Sign { path, .. } => Some(path.clone()),
                _ => None,
            })
            .collect()
    }

    /// Index of the first thin of `path`.
    #[must_use]
    pub fn thin_index(&self, path: &Utf8Path) -> Option<usize> {
        self.ops
            .borrow()
            .iter()
            .position(|op| matches!(op, RecordedOp::Thin(p) if p == path))
    }

    /// Index of the first signing of `path`.
    #[must_use]
    pub fn sign_index(&self, path: &Utf8Path) -> Option<usize> {
        self.ops
            .borrow()
            .iter()
            .position(|op| matches!(op, RecordedOp::Sign { path: p, .. } if p == path))
    }

    fn record(&self, op: RecordedOp) {
        self.ops.borrow_mut().push(op);
    }
}

impl Thinner for RecordingTools {
    fn thin(&self, path: &Utf8Path, _arch: Arch) -> Result<ThinOutcome> {
        fs::symlink_metadata(path)?;
        self.record(RecordedOp::Thin(path.to_owned()));
        Ok(ThinOutcome::Thinned)
    }
}

impl Signer for RecordingTools {
    fn sign(&self, path: &Utf8Path, entitlements: Option<&Utf8Path>) -> Result<()> {
        fs::symlink_metadata(path)?;
        self.record(RecordedOp::Sign {
            path: path.to_owned(),
            entitlements: entitlements.map(Utf8Path::to_owned),
        });
        Ok(())
    }
}

impl Mirror for RecordingTools {
    fn mirror(&self, request: &MirrorRequest<'_>) -> Result<()> {
        mirror_tree(request)?;
        self.record(RecordedOp::Mirror {
            source: request.source.to_owned(),
            dest: request.dest.to_owned(),
        });
        Ok(())
    }
}

/// Locator double returning a fixed PyQt tree.
#[derive(Debug, Clone)]
pub struct FixedLocator(pub Utf8PathBuf);

impl BindingLocator for FixedLocator {
    fn locate(&self, _major: QtMajor) -> Result<Utf8PathBuf> {
        Ok(self.0.clone())
    }
}

/// Build a minimal Qt distribution under `parent/<version>` and return its
/// root.
///
/// The distribution holds one translation worth bundling and one that is
/// not, an allowed and an excluded plugin family, and `QtCore`, `QtTest` and
/// `QtWebEngineCore` frameworks laid out with versioned symlinks, the last
/// carrying the WebEngine helper application.
///
/// # Panics
///
/// Panics if any part of the tree cannot be written.
#[must_use]
pub fn build_qt_install(parent: &Utf8Path, version: &str) -> Utf8PathBuf {
    let root = parent.join(version);
    let bin = root.join(QtMajor::from_dir_name(version).bin_dir_name());

    write_file(&bin.join("translations/qtbase_de.qm"), "de");
    write_file(&bin.join("translations/qtwebengine_de.qm"), "webengine de");
    write_file(&bin.join("plugins/platforms/libqcocoa.dylib"), "cocoa");
    write_file(&bin.join("plugins/sqldrivers/libqsqlite.dylib"), "sqlite");

    let lib = bin.join("lib");
    for module in ["QtCore", "QtTest", "QtWebEngineCore"] {
        let bundle = lib.join(format!("{module}.framework"));
        let version_dir = bundle.join("Versions/5");
        write_file(&version_dir.join(module), module);
        write_file(&version_dir.join("Headers/qglobal.h"), "header");
        write_file(&version_dir.join("Resources/Info.plist"), "plist");
        link(Path::new("5"), &bundle.join("Versions/Current"));
        link(
            Path::new(&format!("Versions/Current/{module}")),
            &bundle.join(module),
        );
    }
    write_file(
        &lib.join(
            "QtWebEngineCore.framework/Versions/5/Helpers/QtWebEngineProcess.app/Contents/MacOS/QtWebEngineProcess",
        ),
        "helper",
    );
    root
}

/// Build a minimal PyQt package at `dir` with one module of each kind the
/// binding copier distinguishes.
///
/// # Panics
///
/// Panics if any part of the tree cannot be written.
pub fn build_pyqt_tree(dir: &Utf8Path) {
    for (name, contents) in [
        ("__init__.py", "# PyQt package\n"),
        ("QtCore.abi3.so", "core"),
        ("QtWidgets.abi3.so", "widgets"),
        ("QtDesigner.abi3.so", "designer"),
        ("QtCore.pyi", "stub"),
        ("py.typed", ""),
        ("uic.py", "tool"),
    ] {
        write_file(&dir.join(name), contents);
    }
    fs::create_dir_all(dir.join("bindings/QtCore")).expect("create bindings dir");
}

fn write_file(path: &Utf8Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent directory");
    }
    fs::write(path, contents).expect("write fixture file");
}

fn link(original: &Path, link_path: &Utf8Path) {
    symlink(original, link_path.as_std_path()).expect("create fixture symlink");
}

/// In-process equivalent of `rsync -a --delete --exclude ...`.
fn mirror_tree(request: &MirrorRequest<'_>) -> Result<()> {
    let source = request.source.as_std_path();
    let dest = request.dest.as_std_path();
    let is_excluded = |path: &Path| {
        path.file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| request.excludes.contains(&name))
    };

    fs::metadata(source)?;
    fs::create_dir_all(dest)?;

    // Stale entries first, so type changes (dir -> link) can be recreated.
    let mut stale = Vec::new();
    for entry in WalkDir::new(dest)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_excluded(e.path()))
    {
        let entry = entry?;
        let relative = entry.path().strip_prefix(dest).unwrap_or(entry.path());
        let counterpart = fs::symlink_metadata(source.join(relative));
        let matches = counterpart
            .is_ok_and(|meta| meta.file_type() == entry.file_type());
        if !matches {
            stale.push(entry.path().to_path_buf());
        }
    }
    for path in stale {
        match fs::symlink_metadata(&path) {
            Ok(meta) if meta.is_dir() => fs::remove_dir_all(&path)?,
            Ok(_) => fs::remove_file(&path)?,
            Err(_) => {}
        }
    }

    for entry in WalkDir::new(source)
        .min_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_excluded(e.path()))
    {
        let entry = entry?;
        let relative = entry.path().strip_prefix(source).unwrap_or(entry.path());
        let target = dest.join(relative);
        let file_type = entry.file_type();

        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_symlink() {
            if fs::symlink_metadata(&target).is_ok() {
                fs::remove_file(&target)?;
            }
            symlink(&fs::read_link(entry.path())?, &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }

    Ok(())
}

#[cfg(unix)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(original, link)
}

#[cfg(windows)]
fn symlink(original: &Path, link: &Path) -> std::io::Result<()> {
    std::os::windows::fs::symlink_file(original, link)
}

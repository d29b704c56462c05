//! Qt distribution and output bundle layout.
//!
//! The Qt major version is read from the Qt root directory name (`6.5.3`,
//! `5.14.2`, ...) and decides every version-specific subpath the pipeline
//! touches.

use crate::arch::Arch;
use crate::error::{BundleError, Result};
use camino::{Utf8Path, Utf8PathBuf};
use std::fmt;

/// Name the PyQt package initializer is relocated to under `Resources/`.
pub const PYQT_INIT_RESOURCE: &str = "pyqt_init.py";

/// Major version of the Qt distribution being bundled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QtMajor {
    /// Legacy Qt 5, shipped as single-architecture binaries.
    Qt5,
    /// Qt 6, shipped as universal binaries.
    Qt6,
}

impl QtMajor {
    /// Derive the major version from a Qt root directory name.
    ///
    /// # Examples
    ///
    /// ```
    /// use qt_bundler::layout::QtMajor;
    ///
    /// assert_eq!(QtMajor::from_dir_name("6.5.3"), QtMajor::Qt6);
    /// assert_eq!(QtMajor::from_dir_name("5.14.2"), QtMajor::Qt5);
    /// ```
    #[must_use]
    pub fn from_dir_name(name: &str) -> Self {
        if name.starts_with("6.") {
            Self::Qt6
        } else {
            Self::Qt5
        }
    }

    /// Numeric major version.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Qt5 => 5,
            Self::Qt6 => 6,
        }
    }

    /// Name of the binary directory inside the Qt root.
    #[must_use]
    pub const fn bin_dir_name(self) -> &'static str {
        match self {
            Self::Qt5 => "clang_64",
            Self::Qt6 => "macos",
        }
    }

    /// Name of the PyQt package folder.
    #[must_use]
    pub const fn pyqt_folder_name(self) -> &'static str {
        match self {
            Self::Qt5 => "PyQt5",
            Self::Qt6 => "PyQt6",
        }
    }

    /// Plugin destination, relative to the PyQt package folder.
    #[must_use]
    pub const fn plugin_subpath(self) -> &'static str {
        match self {
            Self::Qt5 => "Qt/plugins",
            Self::Qt6 => "Qt6/plugins",
        }
    }

    /// Bazel repository that provides the PyQt wheel contents.
    #[must_use]
    pub const fn pyqt_repository(self) -> &'static str {
        match self {
            Self::Qt5 => "pyqt514",
            Self::Qt6 => "pyqt6",
        }
    }

    /// Whether binaries need thinning to a single architecture.
    #[must_use]
    pub const fn ships_universal_binaries(self) -> bool {
        matches!(self, Self::Qt6)
    }
}

impl fmt::Display for QtMajor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Qt{}", self.number())
    }
}

/// Location and version of the Qt distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QtLayout {
    root: Utf8PathBuf,
    major: QtMajor,
}

impl QtLayout {
    /// Derive the layout from the Qt root directory.
    ///
    /// # Errors
    ///
    /// Returns `BundleError::InvalidQtRoot` if the path has no final
    /// component to read the version from.
    pub fn from_root(root: &Utf8Path) -> Result<Self> {
        let name = root
            .file_name()
            .ok_or_else(|| BundleError::InvalidQtRoot {
                path: root.to_owned(),
                reason: "path has no version-named final component".to_owned(),
            })?;

        Ok(Self {
            root: root.to_owned(),
            major: QtMajor::from_dir_name(name),
        })
    }

    /// The Qt root directory.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Major version of the distribution.
    #[must_use]
    pub const fn major(&self) -> QtMajor {
        self.major
    }

    /// Directory containing `lib/`, `plugins/` and `translations/`.
    #[must_use]
    pub fn bin_dir(&self) -> Utf8PathBuf {
        self.root.join(self.major.bin_dir_name())
    }
}

/// Fixed substructure of the output tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    root: Utf8PathBuf,
    major: QtMajor,
}

impl OutputLayout {
    /// Create the layout rooted at `root` for the given Qt major version.
    #[must_use]
    pub fn new(root: &Utf8Path, major: QtMajor) -> Self {
        Self {
            root: root.to_owned(),
            major,
        }
    }

    /// The output root.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// `Resources/`, holding translations and the relocated initializer.
    #[must_use]
    pub fn resources(&self) -> Utf8PathBuf {
        self.root.join("Resources")
    }

    /// `MacOS/lib/PyQt{5,6}/`, holding the binding tree and plugins.
    #[must_use]
    pub fn pyqt_lib(&self) -> Utf8PathBuf {
        self.root
            .join("MacOS")
            .join("lib")
            .join(self.major.pyqt_folder_name())
    }

    /// `Frameworks/`, holding the mirrored Qt frameworks.
    #[must_use]
    pub fn frameworks(&self) -> Utf8PathBuf {
        self.root.join("Frameworks")
    }
}

/// Run configuration shared by every pipeline stage.
///
/// Built once by the driver and passed by reference; nothing in the
/// pipeline reads global state.
#[derive(Debug, Clone)]
pub struct BundleContext {
    /// Architecture binaries are thinned to.
    pub arch: Arch,
    /// The Qt distribution being bundled.
    pub qt: QtLayout,
    /// The output tree being produced.
    pub output: OutputLayout,
    /// Root of the application source repository (bazel workspace).
    pub source_repo: Utf8PathBuf,
    /// Entitlements applied to the WebEngine helper application.
    pub helper_entitlements: Utf8PathBuf,
}

impl BundleContext {
    /// Derive the run configuration from the three invocation paths.
    ///
    /// # Errors
    ///
    /// Returns `BundleError::InvalidQtRoot` if the Qt root is unusable.
    pub fn new(
        qt_root: &Utf8Path,
        source_repo: &Utf8Path,
        output_root: &Utf8Path,
        arch: Arch,
        helper_entitlements: &Utf8Path,
    ) -> Result<Self> {
        let qt = QtLayout::from_root(qt_root)?;
        let output = OutputLayout::new(output_root, qt.major());
        Ok(Self {
            arch,
            qt,
            output,
            source_repo: source_repo.to_owned(),
            helper_entitlements: helper_entitlements.to_owned(),
        })
    }

    /// Major version of the Qt distribution.
    #[must_use]
    pub const fn major(&self) -> QtMajor {
        self.qt.major()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::qt6("/opt/Qt/6.5.3", QtMajor::Qt6, "macos", "PyQt6")]
    #[case::qt5("/opt/Qt/5.14.2", QtMajor::Qt5, "clang_64", "PyQt5")]
    #[case::unversioned("/opt/Qt/latest", QtMajor::Qt5, "clang_64", "PyQt5")]
    fn qt_root_name_selects_layout(
        #[case] root: &str,
        #[case] major: QtMajor,
        #[case] bin: &str,
        #[case] pyqt: &str,
    ) {
        let context = BundleContext::new(
            Utf8Path::new(root),
            Utf8Path::new("/src/anki"),
            Utf8Path::new("/out"),
            Arch::Arm64,
            Utf8Path::new("/tmp/ent.xml"),
        )
        .expect("valid qt root");

        assert_eq!(context.major(), major);
        assert_eq!(context.qt.bin_dir(), Utf8Path::new(root).join(bin));
        assert_eq!(
            context.output.pyqt_lib(),
            Utf8PathBuf::from(format!("/out/MacOS/lib/{pyqt}"))
        );
    }

    #[test]
    fn version_six_prefix_requires_dot() {
        assert_eq!(QtMajor::from_dir_name("60"), QtMajor::Qt5);
    }

    #[rstest]
    #[case(QtMajor::Qt5, "Qt/plugins", "pyqt514", false)]
    #[case(QtMajor::Qt6, "Qt6/plugins", "pyqt6", true)]
    fn major_specific_paths(
        #[case] major: QtMajor,
        #[case] plugins: &str,
        #[case] repo: &str,
        #[case] universal: bool,
    ) {
        assert_eq!(major.plugin_subpath(), plugins);
        assert_eq!(major.pyqt_repository(), repo);
        assert_eq!(major.ships_universal_binaries(), universal);
    }

    #[test]
    fn output_layout_has_fixed_substructure() {
        let layout = OutputLayout::new(Utf8Path::new("/out"), QtMajor::Qt6);
        assert_eq!(layout.resources(), Utf8Path::new("/out/Resources"));
        assert_eq!(layout.frameworks(), Utf8Path::new("/out/Frameworks"));
    }

    #[test]
    fn root_without_file_name_is_rejected() {
        let err = QtLayout::from_root(Utf8Path::new("/")).expect_err("expected rejection");
        assert!(matches!(err, BundleError::InvalidQtRoot { .. }));
    }
}

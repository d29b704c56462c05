//! Command-line argument definitions for the bundler binaries.

use camino::Utf8PathBuf;
use clap::Parser;

/// Prepare thinned and signed Qt frameworks, plugins and PyQt bindings for
/// the macOS application bundle.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "prepare-qt")]
#[command(version, about)]
#[command(after_help = concat!(
    "The Qt major version is read from the final component of QT_ROOT ",
    "(for example 6.5.3 or 5.14.2).\n\n",
    "EXAMPLE:\n",
    "  $ prepare-qt ~/Qt/6.5.3 ~/src/anki out/qt",
))]
pub struct Cli {
    /// Root of the Qt installation, named after its version.
    #[arg(value_name = "QT_ROOT")]
    pub qt_root: Utf8PathBuf,

    /// Root of the application source repository, used to fetch PyQt.
    #[arg(value_name = "SOURCE_REPO")]
    pub source_repo: Utf8PathBuf,

    /// Directory to populate; replaced if it already exists.
    #[arg(value_name = "OUTPUT_ROOT")]
    pub output_root: Utf8PathBuf,
}

/// Stage prebuilt audio binaries into the audio wheel's package directory.
#[derive(Parser, Debug, Clone, PartialEq, Eq)]
#[command(name = "stage-audio-binaries")]
#[command(version, about)]
#[command(after_help = concat!(
    "Set ANKI_AUDIO_TARGET_OS and ANKI_AUDIO_TARGET_ARCH to stage for a ",
    "platform other than the host.",
))]
pub struct AudioCli {
    /// Package root containing the per-platform build output.
    #[arg(value_name = "PACKAGE_ROOT")]
    pub package_root: Utf8PathBuf,
}

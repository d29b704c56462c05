//! Narrow interfaces over the external tools the pipeline drives.
//!
//! Stages never spawn processes themselves; they go through a [`Toolbox`]
//! so the order of mirror, thin and sign operations can be recorded and
//! asserted without the real macOS toolchain.
//!
//! - [`lipo`] - architecture thinning
//! - [`codesign`] - hardened-runtime signing
//! - [`rsync`] - link-preserving, delete-stale directory mirroring

pub mod codesign;
pub mod lipo;
pub mod rsync;

use crate::arch::Arch;
use crate::error::Result;
use camino::Utf8Path;

pub use codesign::Codesign;
pub use lipo::Lipo;
pub use rsync::Rsync;

/// What thinning did to a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThinOutcome {
    /// The file was replaced by its single-architecture slice.
    Thinned,
    /// The file already contained a single architecture and was left alone.
    AlreadyThin,
    /// The distribution ships single-architecture binaries; nothing was run.
    Skipped,
}

/// Tally of thinning outcomes across a stage or run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ThinCounts {
    /// Files replaced by their single-architecture slice.
    pub thinned: usize,
    /// Files that were already single-architecture.
    pub already_thin: usize,
    /// Files left alone because the distribution is single-architecture.
    pub skipped: usize,
}

impl ThinCounts {
    /// Count one outcome.
    pub const fn record(&mut self, outcome: ThinOutcome) {
        match outcome {
            ThinOutcome::Thinned => self.thinned += 1,
            ThinOutcome::AlreadyThin => self.already_thin += 1,
            ThinOutcome::Skipped => self.skipped += 1,
        }
    }

    /// Every file handed to the thinner.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.thinned + self.already_thin + self.skipped
    }
}

impl std::ops::Add for ThinCounts {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            thinned: self.thinned + other.thinned,
            already_thin: self.already_thin + other.already_thin,
            skipped: self.skipped + other.skipped,
        }
    }
}

/// Extracts a single architecture slice from a binary, in place.
pub trait Thinner {
    /// Thin `path` to `arch`.
    ///
    /// # Errors
    ///
    /// Returns an error if the thinning tool fails for any reason other than
    /// the input already being single-architecture.
    fn thin(&self, path: &Utf8Path, arch: Arch) -> Result<ThinOutcome>;
}

/// Applies a hardened-runtime code signature.
pub trait Signer {
    /// Sign `path`, optionally embedding an entitlements file.
    ///
    /// # Errors
    ///
    /// Returns an error if the signing tool exits unsuccessfully.
    fn sign(&self, path: &Utf8Path, entitlements: Option<&Utf8Path>) -> Result<()>;
}

/// A directory mirroring request.
///
/// After a successful mirror, `dest` holds exactly the contents of `source`
/// minus anything named in `excludes`: symlinks are recreated verbatim and
/// destination entries missing from the source are deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorRequest<'a> {
    /// Directory whose contents are mirrored.
    pub source: &'a Utf8Path,
    /// Directory that receives the contents.
    pub dest: &'a Utf8Path,
    /// Entry names skipped at any depth.
    pub excludes: &'a [&'a str],
}

/// Synchronises one directory tree onto another.
pub trait Mirror {
    /// Perform the mirror described by `request`.
    ///
    /// # Errors
    ///
    /// Returns an error if the mirroring tool fails.
    fn mirror(&self, request: &MirrorRequest<'_>) -> Result<()>;
}

/// The set of tools a pipeline run uses.
#[derive(Clone, Copy)]
pub struct Toolbox<'a> {
    /// Architecture thinning.
    pub thinner: &'a dyn Thinner,
    /// Code signing.
    pub signer: &'a dyn Signer,
    /// Directory mirroring.
    pub mirror: &'a dyn Mirror,
}

impl<'a> Toolbox<'a> {
    /// Use one value for all three tools.
    ///
    /// Convenient for test doubles that record every operation in a single
    /// sequence.
    #[must_use]
    pub fn uniform<T>(tools: &'a T) -> Self
    where
        T: Thinner + Signer + Mirror + 'a,
    {
        Self {
            thinner: tools,
            signer: tools,
            mirror: tools,
        }
    }

    /// Thin then sign a file that is complete once signed.
    ///
    /// # Errors
    ///
    /// Propagates thinning or signing failures.
    pub fn thin_and_sign(&self, path: &Utf8Path, arch: Arch) -> Result<ThinOutcome> {
        let outcome = self.thinner.thin(path, arch)?;
        self.signer.sign(path, None)?;
        Ok(outcome)
    }
}

//! Audio binary staging for the platform-specific audio wheel.
//!
//! The target is read from `ANKI_AUDIO_TARGET_OS` and
//! `ANKI_AUDIO_TARGET_ARCH`, falling back to the host. Prebuilt `mpv` and
//! `lame` binaries (plus their dylibs on macOS) are copied from the
//! per-platform build output into `<package-root>/anki_audio`.

use crate::error::Result;
use crate::stages::{copy_with_times, ensure_dir, sorted_entries};
use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, trace};
use serde::Serialize;

/// Environment variable overriding the target operating system.
pub const TARGET_OS_ENV: &str = "ANKI_AUDIO_TARGET_OS";

/// Environment variable overriding the target machine architecture.
pub const TARGET_ARCH_ENV: &str = "ANKI_AUDIO_TARGET_ARCH";

/// Directory under the package root receiving the binaries.
pub const AUDIO_PACKAGE_DIR: &str = "anki_audio";

/// Platform the audio wheel is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioTarget {
    /// macOS on Apple silicon.
    MacArm64,
    /// macOS on Intel.
    MacX86_64,
    /// 64-bit Windows.
    Windows,
    /// Any platform without prebuilt audio binaries.
    Unsupported,
}

impl AudioTarget {
    /// Resolve the target from the environment overrides or the host.
    #[must_use]
    pub fn detect() -> Self {
        let os = std::env::var(TARGET_OS_ENV).unwrap_or_else(|_| host_os().to_owned());
        let arch = std::env::var(TARGET_ARCH_ENV).unwrap_or_else(|_| host_arch().to_owned());
        Self::from_parts(&os, &arch)
    }

    /// Resolve the target from an operating system and machine name, as
    /// reported by `uname`. Matching is case-insensitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use qt_bundler::audio::AudioTarget;
    ///
    /// assert_eq!(AudioTarget::from_parts("Darwin", "arm64"), AudioTarget::MacArm64);
    /// assert_eq!(AudioTarget::from_parts("darwin", "x86_64"), AudioTarget::MacX86_64);
    /// assert_eq!(AudioTarget::from_parts("Windows", "AMD64"), AudioTarget::Windows);
    /// assert_eq!(AudioTarget::from_parts("linux", "x86_64"), AudioTarget::Unsupported);
    /// ```
    #[must_use]
    pub fn from_parts(os: &str, arch: &str) -> Self {
        match (os.to_lowercase().as_str(), arch.to_lowercase().as_str()) {
            ("darwin", "arm64") => Self::MacArm64,
            ("darwin", _) => Self::MacX86_64,
            ("windows", _) => Self::Windows,
            _ => Self::Unsupported,
        }
    }

    /// Wheel platform tag, if the target has binaries.
    #[must_use]
    pub const fn wheel_tag(self) -> Option<&'static str> {
        match self {
            Self::MacArm64 => Some("cp39-abi3-macosx_11_0_arm64"),
            Self::MacX86_64 => Some("cp39-abi3-macosx_11_0_x86_64"),
            Self::Windows => Some("py3-none-win_amd64"),
            Self::Unsupported => None,
        }
    }

    /// Build output directory holding the binaries, relative to the package
    /// root.
    #[must_use]
    pub const fn source_dir(self) -> Option<&'static str> {
        match self {
            Self::MacArm64 => Some("mac/arm64/dist/audio/Resources"),
            Self::MacX86_64 => Some("mac/amd64/dist/audio/Resources"),
            Self::Windows => Some("win/dist/audio"),
            Self::Unsupported => None,
        }
    }

    /// Executables and libraries staged from the source directory.
    #[must_use]
    pub const fn binaries(self) -> &'static [&'static str] {
        match self {
            Self::MacArm64 | Self::MacX86_64 => &["mpv", "lame"],
            Self::Windows => &["mpv.exe", "lame.exe", "lame_enc.dll", "d3dcompiler_43.dll"],
            Self::Unsupported => &[],
        }
    }

    /// Whether dynamic libraries are staged alongside the binaries.
    #[must_use]
    pub const fn stages_dylibs(self) -> bool {
        matches!(self, Self::MacArm64 | Self::MacX86_64)
    }
}

/// `uname`-style operating system name of the host.
fn host_os() -> &'static str {
    match std::env::consts::OS {
        "macos" => "darwin",
        other => other,
    }
}

/// `uname`-style machine name of the host.
fn host_arch() -> &'static str {
    match std::env::consts::ARCH {
        "aarch64" => "arm64",
        other => other,
    }
}

/// What was staged, printed as JSON by the staging binary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StagedAudio {
    /// Wheel platform tag, absent for unsupported targets.
    pub tag: Option<&'static str>,
    /// Receiving directory, absent when nothing was staged.
    pub dest: Option<Utf8PathBuf>,
    /// Staged files, relative to `dest`.
    pub files: Vec<Utf8PathBuf>,
}

/// Copy the audio binaries for `target` into `package_root/anki_audio`.
///
/// Binaries missing from the build output are skipped.
///
/// # Errors
///
/// Returns an error if the destination cannot be created or a copy fails.
pub fn stage_audio_binaries(package_root: &Utf8Path, target: AudioTarget) -> Result<StagedAudio> {
    let Some(source_dir) = target.source_dir() else {
        debug!("no audio binaries for this platform");
        return Ok(StagedAudio::default());
    };
    let source = package_root.join(source_dir);
    let dest = package_root.join(AUDIO_PACKAGE_DIR);
    ensure_dir(&dest)?;

    let mut files = Vec::new();
    for name in target.binaries() {
        let from = source.join(name);
        if !from.exists() {
            trace!("{from} not built; skipping");
            continue;
        }
        copy_with_times(&from, &dest.join(name))?;
        files.push(Utf8PathBuf::from(name));
    }

    if target.stages_dylibs() {
        files.extend(stage_dylibs(&source, &dest)?);
    }

    Ok(StagedAudio {
        tag: target.wheel_tag(),
        dest: Some(dest),
        files,
    })
}

/// Copy `*.dylib` from `libs/`, or `lib/` when there is no `libs/`, into a
/// directory of the same name under `dest`.
fn stage_dylibs(source: &Utf8Path, dest: &Utf8Path) -> Result<Vec<Utf8PathBuf>> {
    let libs = source.join("libs");
    let lib_dir = if libs.exists() { libs } else { source.join("lib") };
    if !lib_dir.is_dir() {
        return Ok(Vec::new());
    }
    let Some(dir_name) = lib_dir.file_name() else {
        return Ok(Vec::new());
    };

    let dylibs: Vec<_> = sorted_entries(&lib_dir)?
        .into_iter()
        .filter(|entry| !entry.is_dir && entry.name.ends_with(".dylib"))
        .collect();
    if dylibs.is_empty() {
        return Ok(Vec::new());
    }

    let lib_dest = dest.join(dir_name);
    ensure_dir(&lib_dest)?;
    let mut staged = Vec::with_capacity(dylibs.len());
    for entry in dylibs {
        copy_with_times(&entry.path, &lib_dest.join(&entry.name))?;
        staged.push(Utf8Path::new(dir_name).join(&entry.name));
    }
    Ok(staged)
}

#[cfg(test)]
#[path = "audio_tests.rs"]
mod tests;

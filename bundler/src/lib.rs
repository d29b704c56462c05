//! Qt bundle preparation for the macOS application.
//!
//! This crate copies the Qt frameworks, plugins, translations and PyQt
//! bindings the application needs into a bundle-ready tree, thinning every
//! binary to the target architecture and code-signing it under the hardened
//! runtime. It is used by the `prepare-qt` binary; `stage-audio-binaries`
//! reuses its plumbing to stage the audio wheel.
//!
//! # Modules
//!
//! - [`arch`] - Target architecture resolution
//! - [`audio`] - Audio binary staging for the audio wheel
//! - [`bazel`] - Locating the fetched PyQt distribution
//! - [`cli`] - Command-line argument definitions
//! - [`command`] - External command execution
//! - [`entitlements`] - Embedded WebEngine helper entitlements
//! - [`error`] - Semantic error types
//! - [`layout`] - Qt distribution and output tree layout
//! - [`output`] - Progress and summary formatting
//! - [`pipeline`] - Stage orchestration
//! - [`preflight`] - Host tool checks
//! - [`stages`] - Bindings, translations, plugins and frameworks
//! - [`tools`] - lipo, codesign and rsync adapters

pub mod arch;
pub mod audio;
pub mod bazel;
pub mod cli;
pub mod command;
pub mod entitlements;
pub mod error;
pub mod layout;
pub mod output;
pub mod pipeline;
pub mod preflight;
pub mod stages;
#[cfg(any(test, feature = "test-support"))]
pub mod test_utils;
pub mod tools;

//! Hardened-runtime signing via `codesign`.

use super::Signer;
use crate::command::{CommandExecutor, require_success};
use crate::error::Result;
use camino::Utf8Path;
use log::debug;

/// Signing identity passed to `codesign -s`.
///
/// A prefix match is enough for `codesign` to pick the Developer ID
/// certificate from the build host's keychain.
pub const SIGNING_IDENTITY: &str = "Developer ID Application:";

/// Signs files and bundles with `codesign -o runtime`.
pub struct Codesign<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> Codesign<'a> {
    /// Create a signer that runs `codesign` through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }
}

impl Signer for Codesign<'_> {
    fn sign(&self, path: &Utf8Path, entitlements: Option<&Utf8Path>) -> Result<()> {
        let mut args = vec!["-vvvv", "-o", "runtime", "-s", SIGNING_IDENTITY];
        if let Some(entitlements) = entitlements {
            args.extend(["--entitlements", entitlements.as_str()]);
        }
        args.push(path.as_str());

        require_success("codesign", self.executor.run("codesign", &args)?)?;
        debug!("signed {path}");
        Ok(())
    }
}

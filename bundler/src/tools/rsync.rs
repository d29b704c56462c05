//! Directory mirroring via `rsync -a --delete`.

use super::{Mirror, MirrorRequest};
use crate::command::{CommandExecutor, require_success};
use crate::error::Result;
use log::debug;
use std::fs;

/// Mirrors directory trees with `rsync`, preserving links and attributes.
pub struct Rsync<'a> {
    executor: &'a dyn CommandExecutor,
}

impl<'a> Rsync<'a> {
    /// Create a mirror that runs `rsync` through `executor`.
    #[must_use]
    pub fn new(executor: &'a dyn CommandExecutor) -> Self {
        Self { executor }
    }
}

impl Mirror for Rsync<'_> {
    fn mirror(&self, request: &MirrorRequest<'_>) -> Result<()> {
        fs::create_dir_all(request.dest)?;

        let args = rsync_args(request);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        require_success("rsync", self.executor.run("rsync", &args)?)?;

        debug!("mirrored {} to {}", request.source, request.dest);
        Ok(())
    }
}

/// Build the argument list for a mirror request.
///
/// The trailing slash on the source makes rsync copy the directory's
/// contents rather than the directory itself.
fn rsync_args(request: &MirrorRequest<'_>) -> Vec<String> {
    let mut args = vec!["-a".to_owned(), "--delete".to_owned()];
    for exclude in request.excludes {
        args.push("--exclude".to_owned());
        args.push((*exclude).to_owned());
    }
    args.push(format!("{}/", request.source));
    args.push(request.dest.to_string());
    args
}

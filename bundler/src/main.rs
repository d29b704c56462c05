//! `prepare-qt` entrypoint.
//!
//! Copies, thins and signs the Qt frameworks, plugins and PyQt bindings the
//! macOS application bundle ships, replacing the output tree on every run.

use clap::Parser;
use qt_bundler::arch::Arch;
use qt_bundler::bazel::BazelLocator;
use qt_bundler::cli::Cli;
use qt_bundler::command::SystemCommandExecutor;
use qt_bundler::entitlements::EntitlementsFile;
use qt_bundler::error::Result;
use qt_bundler::layout::{BundleContext, QtLayout};
use qt_bundler::output::{success_message, thin_summary, write_stderr_line};
use qt_bundler::pipeline;
use qt_bundler::preflight::{check_required_tools, required_tools};
use qt_bundler::tools::{Codesign, Lipo, Rsync, Toolbox};
use std::io::Write;

fn main() {
    let cli = Cli::parse();
    let mut stderr = std::io::stderr();
    let run_result = run(&cli, &mut stderr);
    let exit_code = exit_code_for_run_result(run_result, &mut stderr);
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &Cli, stderr: &mut dyn Write) -> Result<()> {
    let qt = QtLayout::from_root(&cli.qt_root)?;
    check_required_tools(&required_tools(qt.major()))?;

    let executor = SystemCommandExecutor;
    // Must outlive the pipeline; codesign reads it when the helper is signed.
    let entitlements = EntitlementsFile::webengine_helper()?;
    let context = BundleContext::new(
        &cli.qt_root,
        &cli.source_repo,
        &cli.output_root,
        Arch::host(&executor),
        entitlements.path(),
    )?;

    let lipo = Lipo::new(&executor, context.major());
    let codesign = Codesign::new(&executor);
    let rsync = Rsync::new(&executor);
    let tools = Toolbox {
        thinner: &lipo,
        signer: &codesign,
        mirror: &rsync,
    };
    let locator = BazelLocator::new(&executor, &context.source_repo);

    let report = pipeline::run(&context, &tools, &locator, stderr)?;
    write_stderr_line(stderr, "");
    write_stderr_line(stderr, success_message(&report, context.output.root()));
    write_stderr_line(stderr, thin_summary(report.thin()));
    Ok(())
}

fn exit_code_for_run_result(result: Result<()>, stderr: &mut dyn Write) -> i32 {
    match result {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(stderr, err);
            1
        }
    }
}

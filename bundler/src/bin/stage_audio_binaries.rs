//! `stage-audio-binaries` entrypoint.
//!
//! Copies the prebuilt audio binaries for the target platform into the audio
//! wheel's package directory and prints what was staged as JSON on stdout.

use clap::Parser;
use qt_bundler::audio::{AudioTarget, StagedAudio, stage_audio_binaries};
use qt_bundler::cli::AudioCli;
use qt_bundler::error::Result;
use qt_bundler::output::write_stderr_line;
use std::io::Write;

fn main() {
    let cli = AudioCli::parse();
    let mut stdout = std::io::stdout();
    let mut stderr = std::io::stderr();
    let exit_code = match run(&cli, &mut stdout) {
        Ok(()) => 0,
        Err(err) => {
            write_stderr_line(&mut stderr, err);
            1
        }
    };
    if exit_code != 0 {
        std::process::exit(exit_code);
    }
}

fn run(cli: &AudioCli, stdout: &mut dyn Write) -> Result<()> {
    let staged = stage_audio_binaries(&cli.package_root, AudioTarget::detect())?;
    write_report(&staged, stdout)
}

fn write_report(staged: &StagedAudio, stdout: &mut dyn Write) -> Result<()> {
    serde_json::to_writer(&mut *stdout, staged).map_err(std::io::Error::from)?;
    writeln!(stdout)?;
    Ok(())
}

//! Target CPU architecture for the bundle.

use crate::command::{CommandExecutor, require_success};
use crate::error::{BundleError, Result};
use log::debug;
use std::fmt;
use std::str::FromStr;

/// CPU architecture the bundle is thinned to.
///
/// Resolved once per run and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 64-bit ARM (Apple silicon).
    Arm64,
    /// 64-bit Intel.
    X86_64,
}

impl Arch {
    /// Resolve the architecture of the build host by asking `uname -m`.
    ///
    /// Anything that is not recognisably 64-bit ARM resolves to
    /// [`Arch::X86_64`]. If `uname` cannot be run, the architecture this
    /// binary was compiled for stands in for the host.
    #[must_use]
    pub fn host(executor: &dyn CommandExecutor) -> Self {
        match Self::query_machine(executor).and_then(|machine| machine.parse()) {
            Ok(arch) => arch,
            Err(BundleError::UnsupportedArch { value }) => {
                debug!("host machine {value} is not arm64; using x86_64");
                Self::X86_64
            }
            Err(err) => {
                debug!("could not query host machine ({err}); using compile target");
                Self::current()
            }
        }
    }

    /// The architecture this binary was compiled for.
    ///
    /// Anything that is not recognisably 64-bit ARM resolves to
    /// [`Arch::X86_64`].
    #[must_use]
    pub fn current() -> Self {
        Self::from_machine(std::env::consts::ARCH)
    }

    fn query_machine(executor: &dyn CommandExecutor) -> Result<String> {
        let output = require_success("uname", executor.run("uname", &["-m"])?)?;
        Ok(String::from_utf8_lossy(&output.stdout).trim().to_owned())
    }

    /// Map a machine identifier (as reported by `uname -m` or the Rust
    /// target) to an architecture.
    ///
    /// # Examples
    ///
    /// ```
    /// use qt_bundler::arch::Arch;
    ///
    /// assert_eq!(Arch::from_machine("arm64"), Arch::Arm64);
    /// assert_eq!(Arch::from_machine("i386"), Arch::X86_64);
    /// ```
    #[must_use]
    pub fn from_machine(machine: &str) -> Self {
        match machine {
            "arm64" | "aarch64" => Self::Arm64,
            _ => Self::X86_64,
        }
    }

    /// The architecture name understood by `lipo -thin`.
    #[must_use]
    pub const fn lipo_name(self) -> &'static str {
        match self {
            Self::Arm64 => "arm64",
            Self::X86_64 => "x86_64",
        }
    }
}

impl FromStr for Arch {
    type Err = BundleError;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_ascii_lowercase().as_str() {
            "arm64" | "aarch64" => Ok(Self::Arm64),
            "x86_64" | "amd64" => Ok(Self::X86_64),
            _ => Err(BundleError::UnsupportedArch {
                value: value.to_owned(),
            }),
        }
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.lipo_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{ExpectedCall, StubExecutor, failure_output, success_output};
    use rstest::rstest;

    fn uname_reports(stdout: &str) -> StubExecutor {
        let mut output = success_output();
        output.stdout = stdout.as_bytes().to_vec();
        StubExecutor::new(vec![ExpectedCall::new("uname", &["-m"], Ok(output))])
    }

    #[rstest]
    #[case::apple_silicon("arm64\n", Arch::Arm64)]
    #[case::intel("x86_64\n", Arch::X86_64)]
    #[case::unrecognised("i386\n", Arch::X86_64)]
    fn host_reads_uname(#[case] stdout: &str, #[case] expected: Arch) {
        let executor = uname_reports(stdout);
        assert_eq!(Arch::host(&executor), expected);
        executor.assert_finished();
    }

    #[test]
    fn host_falls_back_to_compile_target_when_uname_fails() {
        let executor = StubExecutor::new(vec![ExpectedCall::new(
            "uname",
            &["-m"],
            Ok(failure_output("uname: not found")),
        )]);
        assert_eq!(Arch::host(&executor), Arch::current());
    }

    #[rstest]
    #[case::apple_silicon("arm64", Arch::Arm64)]
    #[case::linux_arm("aarch64", Arch::Arm64)]
    #[case::intel("x86_64", Arch::X86_64)]
    #[case::unknown("sparc", Arch::X86_64)]
    #[case::empty("", Arch::X86_64)]
    fn from_machine_defaults_to_intel(#[case] machine: &str, #[case] expected: Arch) {
        assert_eq!(Arch::from_machine(machine), expected);
    }

    #[rstest]
    #[case("arm64", Arch::Arm64)]
    #[case("AMD64", Arch::X86_64)]
    #[case("x86_64", Arch::X86_64)]
    fn overrides_parse(#[case] value: &str, #[case] expected: Arch) {
        assert_eq!(value.parse::<Arch>().expect("valid arch"), expected);
    }

    #[test]
    fn unknown_override_is_rejected() {
        let err = "ppc".parse::<Arch>().expect_err("expected rejection");
        assert!(matches!(err, BundleError::UnsupportedArch { value } if value == "ppc"));
    }

    #[test]
    fn display_matches_lipo_name() {
        assert_eq!(Arch::Arm64.to_string(), "arm64");
        assert_eq!(Arch::X86_64.to_string(), "x86_64");
    }
}

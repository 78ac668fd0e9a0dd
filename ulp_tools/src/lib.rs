//! Shared pieces of the `ulp-packer` and `ulp-check` binaries.

use clap::Args;
use ulp::Verbosity;

pub mod ptrace;

/// The `-v`/`-q` switches every tool understands
#[derive(Args, Debug, Default)]
pub struct VerbosityArgs {
    /// Print debug messages
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Print nothing but errors
    #[arg(short, long)]
    quiet: bool,
}

impl VerbosityArgs {
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else if self.verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

//! CLI entrypoint for `replicant-call`.
//!
//! The binary delegates to [`replicant_cli::run`], which loads configuration,
//! connects to the cluster, and invokes the configured function once per line
//! of standard input.

use std::io::{self, StderrLock, StdinLock, StdoutLock};
use std::process::ExitCode;

fn main() -> ExitCode {
    let mut stdin: StdinLock<'_> = io::stdin().lock();
    let mut stdout: StdoutLock<'_> = io::stdout().lock();
    let mut stderr: StderrLock<'_> = io::stderr().lock();
    replicant_cli::run(std::env::args_os(), &mut stdin, &mut stdout, &mut stderr)
}

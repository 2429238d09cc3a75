//! Command-line runtime for `replicant-call`.
//!
//! The runtime owns argument parsing, configuration bootstrapping, telemetry
//! set-up, and the line loop that turns standard input into cluster calls. It
//! is exercised both from the binary entrypoint and from tests, where the
//! configuration loader and IO streams are substituted.

use std::ffi::OsString;
use std::io::{BufRead, Write};
use std::process::ExitCode;

use clap::Parser;
use replicant_client::{Call, RequestDriver, Session};
use replicant_config::Config;
use tracing::info;

mod cli;
mod config;
mod errors;
mod relay;
mod telemetry;

use cli::Cli;
use config::split_config_arguments;
pub(crate) use config::{ConfigLoader, OrthoConfigLoader};
pub(crate) use errors::AppError;
use relay::relay_lines;

const CLI_TARGET: &str = "replicant_cli";

/// Bundles the IO streams provided to the CLI runtime.
pub(crate) struct IoStreams<'a, R: BufRead, W: Write, E: Write> {
    pub(crate) stdin: &'a mut R,
    pub(crate) stdout: &'a mut W,
    pub(crate) stderr: &'a mut E,
}

impl<'a, R: BufRead, W: Write, E: Write> IoStreams<'a, R, W, E> {
    pub(crate) fn new(stdin: &'a mut R, stdout: &'a mut W, stderr: &'a mut E) -> Self {
        Self {
            stdin,
            stdout,
            stderr,
        }
    }
}

struct CliRunner<'a, 'io, R: BufRead, W: Write, E: Write, L: ConfigLoader> {
    io: &'a mut IoStreams<'io, R, W, E>,
    loader: &'a L,
}

impl<'a, 'io, R, W, E, L> CliRunner<'a, 'io, R, W, E, L>
where
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    fn new(io: &'a mut IoStreams<'io, R, W, E>, loader: &'a L) -> Self {
        Self { io, loader }
    }

    fn run<I>(&mut self, args: I) -> ExitCode
    where
        I: IntoIterator<Item = OsString>,
    {
        let args: Vec<OsString> = args.into_iter().collect();
        let split = split_config_arguments(&args);

        let cli = match Cli::try_parse_from(split.cli_arguments.iter().cloned()) {
            Ok(cli) => cli,
            // `--help` and `--version` arrive as errors destined for stdout.
            Err(error) if !error.use_stderr() => {
                let _ = write!(self.io.stdout, "{error}");
                return ExitCode::SUCCESS;
            }
            Err(error) => return self.fail(&AppError::CliUsage(error)),
        };

        let result = self
            .loader
            .load(&split.config_arguments)
            .and_then(|config| self.call_cluster(&cli, &config));

        match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => self.fail(&error),
        }
    }

    fn call_cluster(&mut self, cli: &Cli, config: &Config) -> Result<(), AppError> {
        telemetry::initialise(config)?;
        let template = Call::new(config.object(), config.function(), Vec::new())?;
        let session = Session::connect(config.cluster())?;
        let mut driver = RequestDriver::new(session);

        let completed = relay_lines(
            &mut *self.io.stdin,
            &mut *self.io.stdout,
            &mut driver,
            &template,
            cli.timeout_ms,
        )?;

        driver.into_inner().disconnect()?;
        info!(
            target: CLI_TARGET,
            completed,
            object = template.object(),
            function = template.function(),
            "all input processed"
        );
        Ok(())
    }

    fn fail(&mut self, error: &AppError) -> ExitCode {
        let _ = writeln!(self.io.stderr, "{error}");
        ExitCode::FAILURE
    }
}

/// Runs the CLI using the provided arguments and IO handles.
///
/// Every line read from `stdin` is sent as one call; each result is written to
/// `stdout` on its own line. The first failure is reported on `stderr` and
/// ends the run with a failing exit code. End of input disconnects cleanly.
#[must_use]
pub fn run<I, R, W, E>(args: I, stdin: &mut R, stdout: &mut W, stderr: &mut E) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
{
    let mut io = IoStreams::new(stdin, stdout, stderr);
    run_with_loader(args, &mut io, &OrthoConfigLoader)
}

/// Runs the CLI with a custom configuration loader.
#[must_use]
pub(crate) fn run_with_loader<I, R, W, E, L>(
    args: I,
    io: &mut IoStreams<'_, R, W, E>,
    loader: &L,
) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
    R: BufRead,
    W: Write,
    E: Write,
    L: ConfigLoader,
{
    CliRunner::new(io, loader).run(args)
}

#[cfg(test)]
mod tests;

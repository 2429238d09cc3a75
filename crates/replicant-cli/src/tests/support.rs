//! Test support for CLI behavioural coverage.
//!
//! Supplies a harness that points the CLI at a fake cluster, feeds it standard
//! input, and captures its output so step definitions and unit tests stay
//! focused on their assertions.

use std::cell::RefCell;
use std::ffi::OsString;
use std::io::Cursor;
use std::net::TcpListener;
use std::process::ExitCode;

use anyhow::{Context, Result, ensure};
use replicant_client::testing::{FakeCluster, RecordedCall, Reply};
use replicant_config::{Config, SocketEndpoint};
use rstest::fixture;

use crate::{AppError, ConfigLoader, IoStreams, run_with_loader};

/// A config loader that starts from a fixed configuration and applies the
/// `--object` and `--function` flags it is handed, without touching the
/// environment or the filesystem.
pub(super) struct StaticConfigLoader {
    config: Config,
}

impl StaticConfigLoader {
    pub(super) fn new(config: Config) -> Self {
        Self { config }
    }
}

impl ConfigLoader for StaticConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        let mut config = self.config.clone();
        let mut tokens = args.iter().skip(1).map(|arg| arg.to_string_lossy());
        while let Some(flag) = tokens.next() {
            let value = tokens.next().map(String::from).unwrap_or_default();
            match flag.as_ref() {
                "--object" => config.object = value,
                "--function" => config.function = value,
                _ => {}
            }
        }
        Ok(config)
    }
}

/// Test world holding CLI state, the fake cluster, and captured output.
#[derive(Default)]
pub(super) struct TestWorld {
    pub config: Config,
    pub cluster: Option<FakeCluster>,
    pub input: Vec<u8>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
    pub exit_code: Option<ExitCode>,
    pub calls: Vec<RecordedCall>,
}

impl TestWorld {
    pub fn start_cluster(&mut self, replies: Vec<Reply>) -> Result<()> {
        let cluster = FakeCluster::spawn(replies).context("spawn fake cluster")?;
        self.config.cluster = cluster.endpoint();
        self.cluster = Some(cluster);
        Ok(())
    }

    /// Points the CLI at a loopback port that nothing listens on.
    pub fn target_unused_port(&mut self) -> Result<()> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).context("bind probe listener")?;
        let port = listener.local_addr().context("probe address")?.port();
        drop(listener);
        self.config.cluster = SocketEndpoint::tcp("127.0.0.1", port);
        Ok(())
    }

    pub fn set_input_lines(&mut self, lines: &[&str]) {
        self.input = lines
            .iter()
            .flat_map(|line| line.bytes().chain(std::iter::once(b'\n')))
            .collect();
    }

    pub fn run(&mut self, command: &str) -> Result<()> {
        self.stdout.clear();
        self.stderr.clear();
        self.calls.clear();
        let args = Self::build_args(command);
        let loader = StaticConfigLoader::new(self.config.clone());
        let mut stdin = Cursor::new(self.input.clone());
        let mut io = IoStreams::new(&mut stdin, &mut self.stdout, &mut self.stderr);
        let exit = run_with_loader(args, &mut io, &loader);
        self.exit_code = Some(exit);
        if let Some(mut cluster) = self.cluster.take() {
            self.calls = cluster.take_calls().context("collect fake cluster calls")?;
        }
        Ok(())
    }

    fn build_args(command: &str) -> Vec<OsString> {
        let mut args = vec![OsString::from("replicant-call")];
        args.extend(
            command
                .split_whitespace()
                .map(|token| OsString::from(token.trim_matches('"'))),
        );
        args
    }

    pub fn stdout_text(&self) -> Result<String> {
        decode_utf8(self.stdout.clone(), "stdout")
    }

    pub fn stderr_text(&self) -> Result<String> {
        decode_utf8(self.stderr.clone(), "stderr")
    }

    pub fn assert_success(&self) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(
            exit == ExitCode::SUCCESS,
            "expected success, got {exit:?} with stderr {:?}",
            self.stderr_text()?
        );
        Ok(())
    }

    pub fn assert_failure(&self) -> Result<()> {
        let exit = self.exit_code.context("exit code recorded")?;
        ensure!(
            exit == ExitCode::FAILURE,
            "expected failure exit code, got {exit:?}"
        );
        Ok(())
    }

    pub fn assert_calls_to(&self, count: usize, target: &str) -> Result<()> {
        ensure!(
            self.calls.len() == count,
            "expected {count} calls but the cluster received {:?}",
            self.calls
        );
        for call in &self.calls {
            let actual = format!("{}.{}", call.object, call.function);
            ensure!(actual == target, "expected calls to {target}, saw {actual}");
        }
        Ok(())
    }
}

pub(super) fn decode_utf8(buffer: Vec<u8>, label: &str) -> Result<String> {
    String::from_utf8(buffer).with_context(|| format!("{label} utf8"))
}

#[fixture]
pub(super) fn world() -> RefCell<TestWorld> {
    RefCell::new(TestWorld::default())
}

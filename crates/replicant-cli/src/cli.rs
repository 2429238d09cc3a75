//! Command-line flags that are not configuration.
//!
//! Configuration flags (`--cluster`, `--object`, and friends) are split off
//! before parsing and handed to `ortho_config`; see [`crate::config`].

use clap::Parser;

const CONFIGURATION_HELP: &str = "\
Configuration:
      --cluster <ENDPOINT>     Cluster endpoint, tcp://host:port or unix:///path [default: tcp://127.0.0.1:1982]
      --object <NAME>          Object that receives every call [default: echo]
      --function <NAME>        Function invoked for every input line [default: func]
      --log-filter <FILTER>    tracing filter for diagnostics on stderr [default: warn]
      --log-format <FORMAT>    Diagnostic format, json or compact [default: compact]
      --config-path <PATH>     TOML configuration file

Every configuration flag can also be set through a REPLICANT_* environment variable.";

/// Invokes a function on a cluster object once per line of standard input.
#[derive(Parser, Debug, Default, PartialEq, Eq)]
#[command(name = "replicant-call", after_help = CONFIGURATION_HELP)]
pub(crate) struct Cli {
    /// Gives up on a call that has not completed within this many
    /// milliseconds. Zero polls once; without the flag calls wait forever.
    #[arg(long, value_name = "MILLIS")]
    pub(crate) timeout_ms: Option<u64>,
}

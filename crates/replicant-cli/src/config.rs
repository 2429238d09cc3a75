//! Configuration loading helpers for the CLI.
//!
//! The logic here separates the flags destined for `ortho_config` from the
//! flags clap parses, so each parser only sees the arguments it understands.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use replicant_config::Config;

use crate::AppError;

/// CLI flags recognised by the configuration loader.
///
/// MAINTENANCE: keep in sync with the fields of `replicant_config::Config`.
const CONFIG_CLI_FLAGS: &[&str] = &[
    "--config-path",
    "--cluster",
    "--object",
    "--function",
    "--log-filter",
    "--log-format",
];

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments. The
    /// first element is the program name.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

#[derive(Debug, Clone, Copy)]
enum FlagAction {
    Include { needs_value: bool },
    Skip,
}

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

impl OrthoConfigLoader {
    fn process_config_flag(argument: &OsStr) -> FlagAction {
        let argument_text = argument.to_string_lossy();
        if !argument_text.starts_with("--") {
            return FlagAction::Skip;
        }

        let (flag, has_inline_value) = match argument_text.split_once('=') {
            Some((flag, _)) => (flag, true),
            None => (&*argument_text, false),
        };

        if CONFIG_CLI_FLAGS.contains(&flag) {
            return FlagAction::Include {
                needs_value: !has_inline_value,
            };
        }

        FlagAction::Skip
    }
}

/// Arguments partitioned between the configuration loader and clap. Both
/// lists start with the program name.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) cli_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };

    let mut split = ConfigArgumentSplit {
        config_arguments: vec![program.clone()],
        cli_arguments: vec![program.clone()],
    };
    let mut pending_value = false;
    let mut passthrough = false;

    for argument in rest {
        if passthrough {
            split.cli_arguments.push(argument.clone());
            continue;
        }
        if pending_value {
            split.config_arguments.push(argument.clone());
            pending_value = false;
            continue;
        }
        if argument == "--" {
            passthrough = true;
            split.cli_arguments.push(argument.clone());
            continue;
        }
        match OrthoConfigLoader::process_config_flag(argument) {
            FlagAction::Include { needs_value } => {
                split.config_arguments.push(argument.clone());
                pending_value = needs_value;
            }
            FlagAction::Skip => split.cli_arguments.push(argument.clone()),
        }
    }

    split
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[test]
    fn inline_value_flags_do_not_need_follow_up_value() {
        let result = OrthoConfigLoader::process_config_flag(OsStr::new("--log-filter=debug"));
        match result {
            FlagAction::Include { needs_value } => assert!(!needs_value),
            FlagAction::Skip => panic!("expected include for known inline flag"),
        }
    }

    #[test]
    fn separate_value_flags_consume_following_argument() {
        let result = OrthoConfigLoader::process_config_flag(OsStr::new("--cluster"));
        match result {
            FlagAction::Include { needs_value } => assert!(needs_value),
            FlagAction::Skip => panic!("expected include for known separated flag"),
        }
    }

    #[rstest]
    #[case("extra")]
    #[case("--timeout-ms")]
    #[case("--unknown")]
    fn other_arguments_are_skipped(#[case] argument: &str) {
        let result = OrthoConfigLoader::process_config_flag(OsStr::new(argument));
        assert!(matches!(result, FlagAction::Skip), "should skip");
    }

    #[test]
    fn configuration_flags_are_collected_wherever_they_appear() {
        let args = os_args(&[
            "replicant-call",
            "--timeout-ms",
            "10",
            "--cluster",
            "tcp://10.0.0.1:2000",
            "--object=kvs",
            "extra",
        ]);

        let split = split_config_arguments(&args);

        assert_eq!(
            split.config_arguments,
            os_args(&[
                "replicant-call",
                "--cluster",
                "tcp://10.0.0.1:2000",
                "--object=kvs"
            ])
        );
        assert_eq!(
            split.cli_arguments,
            os_args(&["replicant-call", "--timeout-ms", "10", "extra"])
        );
    }

    #[test]
    fn arguments_after_a_separator_go_to_clap() {
        let args = os_args(&["replicant-call", "--", "--cluster", "x"]);

        let split = split_config_arguments(&args);

        assert_eq!(split.config_arguments, os_args(&["replicant-call"]));
        assert_eq!(
            split.cli_arguments,
            os_args(&["replicant-call", "--", "--cluster", "x"])
        );
    }

    #[test]
    fn empty_arguments_split_to_nothing() {
        assert_eq!(split_config_arguments(&[]), ConfigArgumentSplit::default());
    }
}

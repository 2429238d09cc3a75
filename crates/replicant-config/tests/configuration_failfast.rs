//! Malformed configuration files must fail loading rather than fall back to
//! defaults.

use std::ffi::{OsStr, OsString};
use std::fs;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use tempfile::TempDir;
use replicant_config::Config;

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

struct EnvOverride {
    key: &'static str,
    previous: Option<OsString>,
    guard: Option<MutexGuard<'static, ()>>,
}

impl EnvOverride {
    fn set_var(key: &'static str, value: &OsStr) -> Self {
        let guard = ENV_MUTEX.lock().expect("env mutex poisoned");
        let previous = std::env::var_os(key);
        unsafe { std::env::set_var(key, value) };
        Self {
            key,
            previous,
            guard: Some(guard),
        }
    }
}

impl Drop for EnvOverride {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(self.key, value) },
            None => unsafe { std::env::remove_var(self.key) },
        }
        drop(self.guard.take());
    }
}

#[test]
fn malformed_config_file_is_reported() {
    let temp_dir = TempDir::new().expect("create temp dir");
    let cli_path = temp_dir.path().join("replicant.toml");
    fs::write(&cli_path, r#"cluster = { transport = "tcp" host = "127.0.0.1" }"#)
        .expect("write malformed config");

    let args = vec![
        OsString::from("replicant-call"),
        OsString::from("--config-path"),
        cli_path.into_os_string(),
    ];

    assert!(Config::load_from_iter(args).is_err());
}

#[test]
fn unparseable_cluster_in_environment_is_reported() {
    let _env = EnvOverride::set_var("REPLICANT_CLUSTER", OsStr::new("udp://127.0.0.1:1982"));
    let args = vec![OsString::from("replicant-call")];
    let error = Config::load_from_iter(args).expect_err("loading must fail");
    assert!(
        !error.to_string().is_empty(),
        "error should carry a diagnostic"
    );
}

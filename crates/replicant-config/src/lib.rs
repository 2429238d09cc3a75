//! Shared configuration for the Replicant call client.
//!
//! Configuration is layered by `ortho_config`: built-in defaults, then a TOML
//! file (`--config-path` or `REPLICANT_CONFIG_PATH`), then `REPLICANT_*`
//! environment variables, and finally command-line flags.

mod defaults;
mod logging;
mod socket;

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

pub use defaults::{
    DEFAULT_CLUSTER_HOST, DEFAULT_CLUSTER_PORT, DEFAULT_FUNCTION, DEFAULT_LOG_FILTER,
    DEFAULT_OBJECT, default_cluster_endpoint, default_function, default_log_filter,
    default_log_filter_string, default_log_format, default_object,
};
pub use logging::{LogFormat, LogFormatParseError};
pub use socket::{SocketEndpoint, SocketParseError};

/// Runtime configuration for `replicant-call`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "REPLICANT")]
pub struct Config {
    /// Cluster endpoint that receives calls.
    #[ortho_config(default = defaults::default_cluster_endpoint())]
    pub cluster: SocketEndpoint,
    /// Object hosted by the cluster.
    #[ortho_config(default = defaults::default_object())]
    pub object: String,
    /// Function invoked on the object for every input line.
    #[ortho_config(default = defaults::default_function())]
    pub function: String,
    /// `tracing` filter expression applied to diagnostics.
    #[ortho_config(default = defaults::default_log_filter_string())]
    pub log_filter: String,
    /// Output format for diagnostics.
    #[ortho_config(default = defaults::default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cluster: default_cluster_endpoint(),
            object: default_object(),
            function: default_function(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Endpoint of the cluster the client connects to.
    #[must_use]
    pub fn cluster(&self) -> &SocketEndpoint {
        &self.cluster
    }

    /// Object name used for every call.
    #[must_use]
    pub fn object(&self) -> &str {
        self.object.as_str()
    }

    /// Function name used for every call.
    #[must_use]
    pub fn function(&self) -> &str {
        self.function.as_str()
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

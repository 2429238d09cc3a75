use crate::logging::LogFormat;
use crate::socket::SocketEndpoint;

/// Host contacted when no cluster is configured.
pub const DEFAULT_CLUSTER_HOST: &str = "127.0.0.1";

/// Port the cluster listens on by default.
pub const DEFAULT_CLUSTER_PORT: u16 = 1982;

/// Object called when none is configured.
pub const DEFAULT_OBJECT: &str = "echo";

/// Function called when none is configured.
pub const DEFAULT_FUNCTION: &str = "func";

/// Default log filter expression. Diagnostics stay quiet unless asked for.
pub const DEFAULT_LOG_FILTER: &str = "warn";

/// Default cluster endpoint.
#[must_use]
pub fn default_cluster_endpoint() -> SocketEndpoint {
    SocketEndpoint::tcp(DEFAULT_CLUSTER_HOST, DEFAULT_CLUSTER_PORT)
}

/// Default object name as an owned string.
#[must_use]
pub fn default_object() -> String {
    DEFAULT_OBJECT.to_owned()
}

/// Default function name as an owned string.
#[must_use]
pub fn default_function() -> String {
    DEFAULT_FUNCTION.to_owned()
}

/// Default log filter expression.
#[must_use]
pub fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format. The client is interactive, so compact wins.
#[must_use]
pub fn default_log_format() -> LogFormat {
    LogFormat::Compact
}

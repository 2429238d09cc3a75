//! Error taxonomy for the call client.

use std::io;

use thiserror::Error;

use crate::{RequestId, StatusCode};

/// Failures surfaced by [`crate::RequestDriver`].
#[derive(Debug, Error)]
pub enum DriverError {
    /// The transport refused to admit the call.
    #[error("could not send request: {description} ({status})")]
    Submission {
        /// Admission status.
        status: StatusCode,
        /// Diagnostic from the transport.
        description: String,
    },
    /// Waiting for a completion failed.
    #[error("could not loop: {description} ({status})")]
    Loop {
        /// Status reported by the completion loop.
        status: StatusCode,
        /// Diagnostic from the transport.
        description: String,
    },
    /// The deadline passed before the call completed. The call stays
    /// outstanding and can be resumed.
    #[error("timed out waiting for request {id}")]
    Timeout {
        /// The call still awaiting completion.
        id: RequestId,
    },
    /// A completion arrived for a call the driver was not waiting on.
    #[error(
        "could not process request: internal error \
         (expected completion for request {expected}, received {received})"
    )]
    Correlation {
        /// Identifier the driver was waiting on.
        expected: RequestId,
        /// Identifier the completion loop produced.
        received: RequestId,
    },
    /// The call completed but the cluster reported failure.
    #[error("could not process request: {description} ({status})")]
    Remote {
        /// Completion status.
        status: StatusCode,
        /// Diagnostic from the transport.
        description: String,
    },
    /// Every outstanding slot is in use.
    #[error("cannot submit: {limit} calls already outstanding")]
    CapacityExhausted {
        /// Configured number of outstanding calls.
        limit: usize,
    },
    /// The identifier does not name an outstanding call of this driver.
    #[error("request {0} is not outstanding")]
    UnknownRequest(RequestId),
}

impl DriverError {
    /// Returns true when retrying the same wait can succeed. Only a deadline
    /// expiry qualifies; correlation failures in particular are never retried.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Status code carried by the error, when there is one.
    #[must_use]
    pub const fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Submission { status, .. }
            | Self::Loop { status, .. }
            | Self::Remote { status, .. } => Some(*status),
            Self::Timeout { .. } => Some(StatusCode::Timeout),
            Self::Correlation { .. } => Some(StatusCode::Internal),
            Self::CapacityExhausted { .. } | Self::UnknownRequest(_) => None,
        }
    }
}

/// Failures while establishing a session.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// The host name did not resolve to a usable address.
    #[error("failed to resolve cluster address {endpoint}: {source}")]
    Resolve {
        /// Endpoint being resolved.
        endpoint: String,
        /// Underlying resolver error.
        #[source]
        source: io::Error,
    },
    /// The socket could not be connected.
    #[error("failed to connect to cluster at {endpoint}: {source}")]
    Connect {
        /// Endpoint being dialled.
        endpoint: String,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },
    /// The completion reader could not be started.
    #[error("failed to start completion reader for {endpoint}: {source}")]
    Spawn {
        /// Endpoint of the session.
        endpoint: String,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// Unix sockets are unavailable on this platform.
    #[cfg(not(unix))]
    #[error("platform does not support Unix sockets: {0}")]
    UnsupportedUnixTransport(String),
}

/// Failure while tearing a session down.
#[derive(Debug, Error)]
#[error("error disconnecting from cluster: {description} ({status})")]
pub struct DisconnectError {
    /// Teardown status.
    pub status: StatusCode,
    /// Diagnostic from the transport.
    pub description: String,
}

/// A call that cannot be submitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidCall {
    /// Object name was blank.
    #[error("the object name must not be empty")]
    EmptyObject,
    /// Function name was blank.
    #[error("the function name must not be empty")]
    EmptyFunction,
}

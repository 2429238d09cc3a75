//! Return codes shared by submission, completion, and teardown.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Outcome attached to a submission, a completion, or a disconnect.
///
/// [`StatusCode::Garbage`] is the default value and marks a status that was
/// never populated. Statuses received from the cluster that this client does
/// not recognise also decode as `Garbage`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCode {
    /// The operation completed.
    Success,
    /// The operation may or may not have been applied.
    Maybe,
    /// Communication with the cluster failed.
    CommFailed,
    /// The endpoint belongs to a different cluster than the session expected.
    ClusterJump,
    /// The named object does not exist.
    ObjectNotFound,
    /// The named object already exists.
    ObjectExists,
    /// The object has no function with the requested name.
    FunctionNotFound,
    /// The cluster failed while executing the call.
    ServerError,
    /// No completion arrived before the deadline.
    Timeout,
    /// The wait was interrupted.
    Interrupted,
    /// A completion was requested while nothing was outstanding.
    NonePending,
    /// The client detected an internal inconsistency.
    Internal,
    /// The client raised an unexpected exception.
    Exception,
    /// Uninitialised or unrecognised status.
    #[default]
    #[serde(other)]
    Garbage,
}

impl StatusCode {
    /// Returns true for [`StatusCode::Success`].
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// Symbolic name used in diagnostics, e.g. `REPLICANT_SUCCESS`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "REPLICANT_SUCCESS",
            Self::Maybe => "REPLICANT_MAYBE",
            Self::CommFailed => "REPLICANT_COMM_FAILED",
            Self::ClusterJump => "REPLICANT_CLUSTER_JUMP",
            Self::ObjectNotFound => "REPLICANT_OBJ_NOT_FOUND",
            Self::ObjectExists => "REPLICANT_OBJ_EXIST",
            Self::FunctionNotFound => "REPLICANT_FUNC_NOT_FOUND",
            Self::ServerError => "REPLICANT_SERVER_ERROR",
            Self::Timeout => "REPLICANT_TIMEOUT",
            Self::Interrupted => "REPLICANT_INTERRUPTED",
            Self::NonePending => "REPLICANT_NONE_PENDING",
            Self::Internal => "REPLICANT_INTERNAL",
            Self::Exception => "REPLICANT_EXCEPTION",
            Self::Garbage => "REPLICANT_GARBAGE",
        }
    }

    /// Static human-readable description, used when the cluster supplied no
    /// message of its own.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::Success => "operation succeeded",
            Self::Maybe => "operation may have been applied; its outcome is unknown",
            Self::CommFailed => "communication with the cluster failed",
            Self::ClusterJump => "the endpoint belongs to a different cluster",
            Self::ObjectNotFound => "object not found",
            Self::ObjectExists => "object already exists",
            Self::FunctionNotFound => "function not found",
            Self::ServerError => "the cluster failed to execute the call",
            Self::Timeout => "timed out waiting for a completion",
            Self::Interrupted => "interrupted while waiting for a completion",
            Self::NonePending => "no calls are outstanding",
            Self::Internal => "internal client error",
            Self::Exception => "unexpected client exception",
            Self::Garbage => "status was never set",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

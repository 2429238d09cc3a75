//! The seam between the request driver and whatever carries calls.
//!
//! A transport admits calls and later reports their completions through a
//! single "next completion" primitive that may surface any outstanding call,
//! not necessarily the most recent one.

use std::time::{Duration, Instant};

use crate::{Call, RequestId, ResultBuffer, StatusCode};

/// How long a completion wait may block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wait {
    /// Block until a completion arrives or the session breaks.
    Forever,
    /// Return immediately when nothing is ready.
    Poll,
    /// Block until the deadline.
    Until(Instant),
}

impl Wait {
    /// Maps a millisecond timeout: negative blocks indefinitely, zero polls,
    /// positive waits at most that long from now.
    #[must_use]
    pub fn from_millis(millis: i64) -> Self {
        match u64::try_from(millis) {
            Err(_) => Self::Forever,
            Ok(0) => Self::Poll,
            Ok(millis) => Self::within(Duration::from_millis(millis)),
        }
    }

    /// A deadline `timeout` from now.
    #[must_use]
    pub fn within(timeout: Duration) -> Self {
        Instant::now()
            .checked_add(timeout)
            .map_or(Self::Forever, Self::Until)
    }

    /// Time left before the deadline; `None` when the wait is unbounded.
    #[must_use]
    pub fn remaining(self) -> Option<Duration> {
        match self {
            Self::Forever => None,
            Self::Poll => Some(Duration::ZERO),
            Self::Until(deadline) => Some(deadline.saturating_duration_since(Instant::now())),
        }
    }
}

/// The outcome of one previously admitted call.
#[derive(Debug)]
pub struct Completion {
    /// Identifier of the call that completed.
    pub id: RequestId,
    /// Outcome reported by the cluster.
    pub status: StatusCode,
    /// Output, present only when `status` is [`StatusCode::Success`].
    pub output: Option<ResultBuffer>,
}

/// Submission and completion primitives a session provides.
pub trait Transport {
    /// Admits `call` and returns its identifier. Admission does not mean the
    /// call has completed.
    ///
    /// # Errors
    ///
    /// Returns the admission status when the call was not accepted. No
    /// completion will ever arrive for a rejected call.
    fn submit(&mut self, call: &Call) -> Result<RequestId, StatusCode>;

    /// Waits for the next completion of any outstanding call.
    ///
    /// # Errors
    ///
    /// Returns [`StatusCode::Timeout`] when `wait` elapses with nothing
    /// ready, or another status when the wait itself failed.
    fn await_completion(&mut self, wait: Wait) -> Result<Completion, StatusCode>;

    /// Human-readable diagnostic for `status`, preferring the most recent
    /// message the session received for it.
    fn describe(&self, status: StatusCode) -> String;

    /// Stops tracking `id` after its caller gave up on it. A completion for
    /// `id` that arrives later is treated as unsolicited.
    fn abandon(&mut self, _id: RequestId) {}
}

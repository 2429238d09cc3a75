use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use crate::buffer::BufferLedger;
use crate::transport::{Completion, Transport, Wait};
use crate::{Call, RequestId, StatusCode};

/// A completion the scripted transport will report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptedCompletion {
    /// Identifier reported as completed.
    pub id: RequestId,
    /// Reported status.
    pub status: StatusCode,
    /// Output issued as a result buffer when present.
    pub output: Option<Vec<u8>>,
}

/// Transport that replays queued outcomes and records how it was driven.
///
/// Every output is issued through a [`BufferLedger`], so tests can assert that
/// each buffer was released exactly once.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    admissions: VecDeque<Result<RequestId, StatusCode>>,
    completions: VecDeque<Result<ScriptedCompletion, StatusCode>>,
    descriptions: HashMap<StatusCode, String>,
    ledger: Arc<BufferLedger>,
    submitted: Vec<Call>,
    waits: Vec<Wait>,
    abandoned: Vec<RequestId>,
}

impl ScriptedTransport {
    /// Creates a transport with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful admission with identifier `id`.
    #[must_use]
    pub fn admit(mut self, id: i64) -> Self {
        self.admissions.push_back(Ok(RequestId::new(id)));
        self
    }

    /// Queues a rejected admission.
    #[must_use]
    pub fn reject(mut self, status: StatusCode) -> Self {
        self.admissions.push_back(Err(status));
        self
    }

    /// Queues a successful completion of `id` carrying `output`.
    #[must_use]
    pub fn succeed(self, id: i64, output: &[u8]) -> Self {
        self.complete(ScriptedCompletion {
            id: RequestId::new(id),
            status: StatusCode::Success,
            output: Some(output.to_vec()),
        })
    }

    /// Queues a failed completion of `id`.
    #[must_use]
    pub fn fail(self, id: i64, status: StatusCode) -> Self {
        self.complete(ScriptedCompletion {
            id: RequestId::new(id),
            status,
            output: None,
        })
    }

    /// Queues an arbitrary completion.
    #[must_use]
    pub fn complete(mut self, completion: ScriptedCompletion) -> Self {
        self.completions.push_back(Ok(completion));
        self
    }

    /// Queues a failed wait.
    #[must_use]
    pub fn break_wait(mut self, status: StatusCode) -> Self {
        self.completions.push_back(Err(status));
        self
    }

    /// Overrides the description returned for `status`.
    #[must_use]
    pub fn describe_as(mut self, status: StatusCode, description: &str) -> Self {
        self.descriptions.insert(status, description.to_owned());
        self
    }

    /// Calls submitted so far, in order.
    #[must_use]
    pub fn submitted(&self) -> &[Call] {
        &self.submitted
    }

    /// Waits requested so far, in order.
    #[must_use]
    pub fn waits(&self) -> &[Wait] {
        &self.waits
    }

    /// Identifiers the driver gave up on, in order.
    #[must_use]
    pub fn abandoned(&self) -> &[RequestId] {
        &self.abandoned
    }

    /// Ledger for the buffers this transport issued.
    #[must_use]
    pub fn ledger(&self) -> &BufferLedger {
        &self.ledger
    }
}

impl Transport for ScriptedTransport {
    fn submit(&mut self, call: &Call) -> Result<RequestId, StatusCode> {
        let admission = self
            .admissions
            .pop_front()
            .unwrap_or(Err(StatusCode::Internal));
        if admission.is_ok() {
            self.submitted.push(call.clone());
        }
        admission
    }

    fn await_completion(&mut self, wait: Wait) -> Result<Completion, StatusCode> {
        self.waits.push(wait);
        let scripted = match self.completions.pop_front() {
            Some(next) => next?,
            None if matches!(wait, Wait::Forever) => return Err(StatusCode::NonePending),
            None => return Err(StatusCode::Timeout),
        };
        let output = if scripted.status.is_success() {
            scripted.output.map(|bytes| self.ledger.issue(bytes))
        } else {
            None
        };
        Ok(Completion {
            id: scripted.id,
            status: scripted.status,
            output,
        })
    }

    fn describe(&self, status: StatusCode) -> String {
        self.descriptions
            .get(&status)
            .cloned()
            .unwrap_or_else(|| status.description().to_owned())
    }

    fn abandon(&mut self, id: RequestId) {
        self.abandoned.push(id);
    }
}

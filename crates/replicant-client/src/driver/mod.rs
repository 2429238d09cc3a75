//! Synchronous request/completion correlation on top of a [`Transport`].
//!
//! The driver submits a call, then waits specifically for *its* completion
//! even though the transport's completion primitive may surface any
//! outstanding call. Every completion is checked against the identifier being
//! awaited before its status or output is looked at.
//!
//! By default at most one call is outstanding, so any other identifier is a
//! correlation failure. [`RequestDriver::with_capacity`] allows several
//! outstanding calls; completions for other registered calls are then parked
//! until their owner asks for them.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::DriverError;
use crate::transport::{Completion, Transport, Wait};
use crate::{Call, RequestId, StatusCode};

const DRIVER_TARGET: &str = "replicant_client::driver";

/// Outstanding calls allowed by [`RequestDriver::new`].
pub const DEFAULT_CAPACITY: usize = 1;

enum Slot {
    Waiting,
    Ready(Completion),
}

/// Drives calls through a transport one completion at a time.
pub struct RequestDriver<T> {
    transport: T,
    capacity: usize,
    pending: HashMap<RequestId, Slot>,
}

impl<T: Transport> RequestDriver<T> {
    /// A driver that keeps at most one call outstanding.
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_capacity(transport, DEFAULT_CAPACITY)
    }

    /// A driver that keeps up to `capacity` calls outstanding (at least one).
    #[must_use]
    pub fn with_capacity(transport: T, capacity: usize) -> Self {
        Self {
            transport,
            capacity: capacity.max(1),
            pending: HashMap::new(),
        }
    }

    /// Borrow the underlying transport.
    #[must_use]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Number of submitted calls whose outcome has not been returned.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.pending.len()
    }

    /// Returns the transport. Parked completions are dropped, which releases
    /// their buffers.
    #[must_use]
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Submits `call` and blocks until its outcome is known.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when admission, the wait, correlation, or the
    /// remote call fails.
    pub fn execute(&mut self, call: &Call) -> Result<Vec<u8>, DriverError> {
        self.execute_within(call, Wait::Forever)
    }

    /// Like [`RequestDriver::execute`] with a bounded wait. On
    /// [`DriverError::Timeout`] the call stays outstanding and can be picked up
    /// again with [`RequestDriver::resume`].
    ///
    /// # Errors
    ///
    /// Returns [`DriverError`] when admission, the wait, correlation, or the
    /// remote call fails.
    pub fn execute_within(&mut self, call: &Call, wait: Wait) -> Result<Vec<u8>, DriverError> {
        let id = self.submit(call)?;
        self.resume(id, wait)
    }

    /// Admits `call` without waiting for it.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::CapacityExhausted`] when every slot is taken and
    /// [`DriverError::Submission`] when the transport rejects the call.
    pub fn submit(&mut self, call: &Call) -> Result<RequestId, DriverError> {
        if self.pending.len() >= self.capacity {
            return Err(DriverError::CapacityExhausted {
                limit: self.capacity,
            });
        }
        let id = self
            .transport
            .submit(call)
            .map_err(|status| DriverError::Submission {
                status,
                description: self.transport.describe(status),
            })?;
        debug!(target: DRIVER_TARGET, request = %id, "awaiting completion");
        self.pending.insert(id, Slot::Waiting);
        Ok(id)
    }

    /// Waits for the outcome of the outstanding call `id`.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnknownRequest`] when `id` is not outstanding,
    /// [`DriverError::Timeout`] when `wait` elapses (the call stays
    /// outstanding), and the other variants when the wait, correlation, or
    /// remote call fails.
    pub fn resume(&mut self, id: RequestId, wait: Wait) -> Result<Vec<u8>, DriverError> {
        match self.pending.remove(&id) {
            None => return Err(DriverError::UnknownRequest(id)),
            Some(Slot::Ready(completion)) => return self.resolve(completion),
            Some(Slot::Waiting) => {}
        }

        loop {
            let completion = match self.transport.await_completion(wait) {
                Ok(completion) => completion,
                Err(StatusCode::Timeout) => {
                    self.pending.insert(id, Slot::Waiting);
                    return Err(DriverError::Timeout { id });
                }
                Err(status) => {
                    return Err(DriverError::Loop {
                        status,
                        description: self.transport.describe(status),
                    });
                }
            };

            if completion.id == id {
                return self.resolve(completion);
            }

            let received = completion.id;
            if matches!(self.pending.get(&received), Some(Slot::Waiting)) {
                debug!(target: DRIVER_TARGET, request = %received, awaited = %id, "parked completion");
                self.pending.insert(received, Slot::Ready(completion));
                continue;
            }

            // The completion and any buffer it carries are dropped unread.
            warn!(target: DRIVER_TARGET, expected = %id, %received, "completion does not match the awaited call");
            self.transport.abandon(id);
            return Err(DriverError::Correlation {
                expected: id,
                received,
            });
        }
    }

    fn resolve(&self, completion: Completion) -> Result<Vec<u8>, DriverError> {
        let Completion { id, status, output } = completion;
        if !status.is_success() {
            return Err(DriverError::Remote {
                status,
                description: self.transport.describe(status),
            });
        }
        let bytes = output.map_or_else(Vec::new, |buffer| {
            let bytes = buffer.to_vec();
            buffer.release();
            bytes
        });
        debug!(target: DRIVER_TARGET, request = %id, len = bytes.len(), "call succeeded");
        Ok(bytes)
    }
}

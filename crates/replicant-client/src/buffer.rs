//! Transport-owned result buffers and the ledger that accounts for them.
//!
//! A [`ResultBuffer`] is handed to the caller with a successful completion and
//! must go back to the transport exactly once. Release happens either through
//! [`ResultBuffer::release`], which consumes the buffer, or when the buffer is
//! dropped on any other path. Both routes notify the [`ReleaseHook`] the
//! transport attached when it issued the buffer.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tracing::{trace, warn};

const BUFFER_TARGET: &str = "replicant_client::buffer";

/// Identity of a buffer issued by a transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BufferId(u64);

impl BufferId {
    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BufferId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// Receives notice that a buffer has been handed back.
pub trait ReleaseHook: Send + Sync {
    /// Called once when the buffer `id` holding `len` bytes is released.
    fn release(&self, id: BufferId, len: usize);
}

/// Output of a successful call, valid until released.
pub struct ResultBuffer {
    id: BufferId,
    bytes: Vec<u8>,
    hook: Option<Arc<dyn ReleaseHook>>,
}

impl ResultBuffer {
    /// Buffer identity.
    #[must_use]
    pub const fn id(&self) -> BufferId {
        self.id
    }

    /// Number of bytes held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns true when the call produced no output.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Borrow the output bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Copies the output into caller-owned memory.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.clone()
    }

    /// Hands the buffer back to the transport.
    pub fn release(mut self) {
        self.give_back();
    }

    fn give_back(&mut self) {
        if let Some(hook) = self.hook.take() {
            hook.release(self.id, self.bytes.len());
            self.bytes = Vec::new();
        }
    }
}

impl Drop for ResultBuffer {
    fn drop(&mut self) {
        self.give_back();
    }
}

impl fmt::Debug for ResultBuffer {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ResultBuffer")
            .field("id", &self.id)
            .field("len", &self.bytes.len())
            .field("released", &self.hook.is_none())
            .finish()
    }
}

/// Issues buffers and tracks which of them are still live.
///
/// Releasing an id the ledger does not consider live is recorded as a double
/// release; [`BufferLedger::double_releases`] exposes the count.
#[derive(Debug, Default)]
pub struct BufferLedger {
    next_id: AtomicU64,
    live: Mutex<HashSet<BufferId>>,
    released: AtomicUsize,
    double_releases: AtomicUsize,
}

impl BufferLedger {
    /// Creates an empty ledger.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Wraps `bytes` in a buffer that reports back to this ledger.
    #[must_use]
    pub fn issue(self: &Arc<Self>, bytes: Vec<u8>) -> ResultBuffer {
        let id = BufferId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
        trace!(target: BUFFER_TARGET, buffer = %id, len = bytes.len(), "issued result buffer");
        let hook: Arc<dyn ReleaseHook> = Arc::clone(self) as Arc<dyn ReleaseHook>;
        ResultBuffer {
            id,
            bytes,
            hook: Some(hook),
        }
    }

    /// Buffers issued and not yet released.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Buffers released so far.
    #[must_use]
    pub fn released(&self) -> usize {
        self.released.load(Ordering::Relaxed)
    }

    /// Releases of buffers that were not live at the time.
    #[must_use]
    pub fn double_releases(&self) -> usize {
        self.double_releases.load(Ordering::Relaxed)
    }
}

impl ReleaseHook for BufferLedger {
    fn release(&self, id: BufferId, len: usize) {
        let was_live = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        if was_live {
            self.released.fetch_add(1, Ordering::Relaxed);
            trace!(target: BUFFER_TARGET, buffer = %id, len, "released result buffer");
        } else {
            self.double_releases.fetch_add(1, Ordering::Relaxed);
            warn!(target: BUFFER_TARGET, buffer = %id, "result buffer released twice");
        }
    }
}

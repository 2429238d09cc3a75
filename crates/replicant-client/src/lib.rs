//! Synchronous call client for a replicated object cluster.
//!
//! A [`Session`] connects to one cluster member and exchanges JSONL frames
//! with it. The [`RequestDriver`] turns the session's asynchronous
//! submit-then-await-any-completion model into a blocking call: it submits,
//! waits for the completion that carries the same [`RequestId`], and hands the
//! output back after releasing the transport's [`ResultBuffer`].
//!
//! The driver only depends on the [`Transport`] trait, so alternative
//! transports and test doubles plug in without touching correlation logic.

mod buffer;
mod call;
mod driver;
mod error;
mod session;
mod status;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;
mod transport;
pub mod wire;

pub use buffer::{BufferId, BufferLedger, ReleaseHook, ResultBuffer};
pub use call::{Call, RequestId};
pub use driver::{DEFAULT_CAPACITY, RequestDriver};
pub use error::{ConnectError, DisconnectError, DriverError, InvalidCall};
pub use session::{CONNECTION_TIMEOUT, Session};
pub use status::StatusCode;
pub use transport::{Completion, Transport, Wait};

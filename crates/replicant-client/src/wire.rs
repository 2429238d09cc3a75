//! JSONL frames exchanged with a cluster member.
//!
//! The client writes one [`ClientFrame`] per call and reads one
//! [`ServerFrame`] per completion. Completions may arrive in any order; the
//! `nonce` ties each back to its call.

use std::borrow::Cow;
use std::io::{self, Write};

use serde::{Deserialize, Serialize};

use crate::{Call, RequestId, StatusCode};

/// Frames sent by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientFrame<'a> {
    /// Invoke `function` on `object`.
    Call {
        /// Identifier echoed back in the completion.
        nonce: RequestId,
        /// Target object.
        object: Cow<'a, str>,
        /// Target function.
        function: Cow<'a, str>,
        /// Argument bytes.
        payload: Cow<'a, [u8]>,
    },
}

impl<'a> ClientFrame<'a> {
    /// Borrows `call` into a frame tagged with `nonce`.
    #[must_use]
    pub fn call(nonce: RequestId, call: &'a Call) -> Self {
        Self::Call {
            nonce,
            object: Cow::Borrowed(call.object()),
            function: Cow::Borrowed(call.function()),
            payload: Cow::Borrowed(call.payload()),
        }
    }
}

/// Frames sent by the cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ServerFrame {
    /// A call finished.
    Completion {
        /// Identifier of the call that finished.
        nonce: RequestId,
        /// Outcome; missing or unknown values decode as
        /// [`StatusCode::Garbage`].
        #[serde(default)]
        status: StatusCode,
        /// Output bytes for successful calls.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        output: Option<Vec<u8>>,
        /// Diagnostic for failed calls.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

/// Serialises `frame` as a single line and flushes it.
///
/// # Errors
///
/// Returns the underlying IO error, or an `InvalidData` error when the frame
/// cannot be serialised.
pub fn write_frame<W, T>(writer: &mut W, frame: &T) -> io::Result<()>
where
    W: Write,
    T: Serialize,
{
    serde_json::to_writer(&mut *writer, frame).map_err(io::Error::from)?;
    writer.write_all(b"\n")?;
    writer.flush()
}

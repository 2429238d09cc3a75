//! Calls and the identifiers that correlate them with their completions.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::InvalidCall;

/// Handle assigned by the transport when a call is admitted.
///
/// Unique among outstanding calls. Once its completion has been consumed the
/// handle no longer refers to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(i64);

impl RequestId {
    /// Wraps a raw identifier.
    #[must_use]
    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    /// Raw identifier value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

/// A named remote invocation: `object.function(payload)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    object: String,
    function: String,
    payload: Vec<u8>,
}

impl Call {
    /// Builds a call, rejecting blank object or function names.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCall`] when either name is empty after trimming.
    pub fn new(
        object: impl Into<String>,
        function: impl Into<String>,
        payload: impl Into<Vec<u8>>,
    ) -> Result<Self, InvalidCall> {
        let object = object.into().trim().to_owned();
        let function = function.into().trim().to_owned();
        if object.is_empty() {
            return Err(InvalidCall::EmptyObject);
        }
        if function.is_empty() {
            return Err(InvalidCall::EmptyFunction);
        }
        Ok(Self {
            object,
            function,
            payload: payload.into(),
        })
    }

    /// Builds a call whose payload is `text` followed by a NUL terminator,
    /// the form cluster objects expect for string arguments.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidCall`] when either name is empty after trimming.
    pub fn with_text(
        object: impl Into<String>,
        function: impl Into<String>,
        text: &str,
    ) -> Result<Self, InvalidCall> {
        let mut payload = Vec::with_capacity(text.len() + 1);
        payload.extend_from_slice(text.as_bytes());
        payload.push(0);
        Self::new(object, function, payload)
    }

    /// The same target invoked with a different payload.
    #[must_use]
    pub fn with_payload(&self, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            object: self.object.clone(),
            function: self.function.clone(),
            payload: payload.into(),
        }
    }

    /// Object the call targets.
    #[must_use]
    pub fn object(&self) -> &str {
        &self.object
    }

    /// Function invoked on the object.
    #[must_use]
    pub fn function(&self) -> &str {
        &self.function
    }

    /// Argument bytes.
    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }
}

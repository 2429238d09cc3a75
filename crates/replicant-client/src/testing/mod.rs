//! Test doubles for the call client.
//!
//! [`ScriptedTransport`] replays canned admissions and completions without a
//! socket. [`FakeCluster`] speaks the JSONL wire protocol over TCP so sessions
//! and the CLI can be exercised end to end.

mod fake_cluster;
mod scripted;

pub use fake_cluster::{FakeCluster, RecordedCall, Reply};
pub use scripted::{ScriptedCompletion, ScriptedTransport};

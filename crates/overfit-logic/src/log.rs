//! Log entries handed to the presentation layer.
//!
//! Entries are a by-product of engine calls and are never read back by
//! the engine. `timestamp` is a logical sequence number stamped by the
//! session that records the entry, not a wall-clock time.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogKind {
    Operation,
    Event,
    Exam,
    System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub kind: LogKind,
    pub message: String,
    pub turn: u32,
    pub timestamp: u64,
}

impl LogEntry {
    /// New unstamped entry.
    pub fn new(kind: LogKind, turn: u32, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            turn,
            timestamp: 0,
        }
    }
}

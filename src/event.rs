//! Maxwell change-event types
//!
//! This module defines the decoded form of one row-change notification as
//! emitted by the Maxwell binlog tailer onto the work queue, along with the
//! row-identifier extraction the rest of the pipeline relies on.
//!
//! A Maxwell message carries more fields than the relay needs (`ts`, `xid`,
//! `commit`, `old`, `primary_key`); unknown fields are ignored during
//! decoding so schema additions upstream never break consumption.

use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;

/// Row operation described by a change event.
///
/// Maxwell emits an open-ended set of `type` strings (`bootstrap-insert`,
/// DDL records, ...). Anything beyond the three row operations decodes into
/// [`Operation::Other`] so the filter can skip it instead of the message
/// failing decode and burning its retry budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Row inserted.
    Insert,
    /// Row updated.
    Update,
    /// Row deleted (unsupported downstream; filtered out).
    Delete,
    /// Any other Maxwell record type (bootstrap, DDL, heartbeat).
    #[serde(other)]
    Other,
}

impl Operation {
    /// Returns the wire name of this operation for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "insert",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One decoded row-change notification.
///
/// # Example
///
/// ```
/// use solr_sync::event::{ChangeEvent, Operation};
///
/// let event = ChangeEvent::decode(
///     br#"{"database":"solr_sync","table":"books","type":"insert","data":{"id":42}}"#,
/// )
/// .unwrap();
///
/// assert_eq!(event.database, "solr_sync");
/// assert_eq!(event.operation, Operation::Insert);
/// assert_eq!(event.row_id(), Some(42));
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeEvent {
    /// Source database the change originated from.
    pub database: String,

    /// Source table the change originated from.
    pub table: String,

    /// Row operation (`type` on the wire).
    #[serde(rename = "type")]
    pub operation: Operation,

    /// Row payload; absent when the source emitted no row data.
    #[serde(default)]
    pub data: Option<Map<String, Value>>,
}

impl ChangeEvent {
    /// Decodes one message body into a change event.
    ///
    /// # Errors
    ///
    /// Returns the underlying `serde_json` error when the body is not valid
    /// JSON or does not match the Maxwell envelope.
    pub fn decode(payload: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(payload)
    }

    /// Extracts the positive integer row identifier from the payload.
    ///
    /// Returns `None` when the payload is absent, has no `id` field, or the
    /// identifier is not a positive integer. Events without a usable
    /// identifier are unprocessable and must be skipped, not retried.
    pub fn row_id(&self) -> Option<i64> {
        self.data
            .as_ref()?
            .get("id")?
            .as_i64()
            .filter(|id| *id > 0)
    }
}

//! Event filtering for Maxwell change events
//!
//! This module decides which decoded change events are in scope for
//! re-indexing. The contract is a pure boolean; the skip reason is advisory
//! and only feeds logging.

use crate::event::{ChangeEvent, Operation};
use std::fmt;

/// Database whose changes the relay mirrors into Solr.
pub const SOURCE_DATABASE: &str = "solr_sync";

/// Tables with a Solr collection behind them.
pub const SUPPORTED_TABLES: &[&str] = &["books", "electronics"];

/// Why an event was skipped.
///
/// Skipping is not a failure: skipped messages are acknowledged immediately.
/// The variants exist so logs can reconstruct a message's path without
/// replaying it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The event belongs to a different database.
    ForeignDatabase,
    /// The table has no Solr collection behind it.
    UnsupportedTable,
    /// Delete and non-row records require different handling downstream.
    UnsupportedOperation,
    /// The row payload has no usable positive-integer identifier.
    MissingRowId,
}

impl SkipReason {
    /// Returns a short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForeignDatabase => "foreign_database",
            Self::UnsupportedTable => "unsupported_table",
            Self::UnsupportedOperation => "unsupported_operation",
            Self::MissingRowId => "missing_row_id",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Filter determining which change events trigger a downstream call.
///
/// # Example
///
/// ```
/// use solr_sync::event::ChangeEvent;
/// use solr_sync::relay::EventFilter;
///
/// let filter = EventFilter::default();
/// let event = ChangeEvent::decode(
///     br#"{"database":"solr_sync","table":"books","type":"insert","data":{"id":42}}"#,
/// )
/// .unwrap();
///
/// assert!(filter.accept(&event));
/// ```
#[derive(Debug, Clone)]
pub struct EventFilter {
    database: String,
    tables: Vec<String>,
}

impl Default for EventFilter {
    fn default() -> Self {
        Self::new(
            SOURCE_DATABASE,
            SUPPORTED_TABLES.iter().map(|t| t.to_string()),
        )
    }
}

impl EventFilter {
    /// Creates a filter for the given source database and table allow-list.
    pub fn new(database: impl Into<String>, tables: impl IntoIterator<Item = String>) -> Self {
        Self {
            database: database.into(),
            tables: tables.into_iter().collect(),
        }
    }

    /// Evaluates an event against the filter rules, in order,
    /// short-circuiting on the first miss.
    ///
    /// Returns `None` when the event is in scope, otherwise the reason it
    /// was skipped.
    pub fn evaluate(&self, event: &ChangeEvent) -> Option<SkipReason> {
        if event.database != self.database {
            return Some(SkipReason::ForeignDatabase);
        }

        if !self.tables.iter().any(|t| t == &event.table) {
            return Some(SkipReason::UnsupportedTable);
        }

        if !matches!(event.operation, Operation::Insert | Operation::Update) {
            return Some(SkipReason::UnsupportedOperation);
        }

        if event.row_id().is_none() {
            return Some(SkipReason::MissingRowId);
        }

        None
    }

    /// Check whether an event should be processed.
    pub fn accept(&self, event: &ChangeEvent) -> bool {
        self.evaluate(event).is_none()
    }

    /// Get filter summary for logging.
    pub fn summary(&self) -> String {
        format!(
            "database={}, tables={}",
            self.database,
            self.tables.join(",")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(json: &str) -> ChangeEvent {
        ChangeEvent::decode(json.as_bytes()).unwrap()
    }

    #[test]
    fn test_accepts_supported_insert() {
        let filter = EventFilter::default();
        let event =
            event(r#"{"database":"solr_sync","table":"books","type":"insert","data":{"id":42}}"#);

        assert_eq!(filter.evaluate(&event), None);
        assert!(filter.accept(&event));
    }

    #[test]
    fn test_accepts_supported_update() {
        let filter = EventFilter::default();
        let event = event(
            r#"{"database":"solr_sync","table":"electronics","type":"update","data":{"id":9}}"#,
        );

        assert!(filter.accept(&event));
    }

    #[test]
    fn test_rejects_foreign_database() {
        let filter = EventFilter::default();
        let event =
            event(r#"{"database":"other_db","table":"books","type":"insert","data":{"id":42}}"#);

        assert_eq!(filter.evaluate(&event), Some(SkipReason::ForeignDatabase));
    }

    #[test]
    fn test_rejects_unsupported_table() {
        let filter = EventFilter::default();
        let event =
            event(r#"{"database":"solr_sync","table":"users","type":"insert","data":{"id":42}}"#);

        assert_eq!(filter.evaluate(&event), Some(SkipReason::UnsupportedTable));
    }

    #[test]
    fn test_rejects_delete_regardless_of_other_fields() {
        let filter = EventFilter::default();
        let event =
            event(r#"{"database":"solr_sync","table":"books","type":"delete","data":{"id":42}}"#);

        assert_eq!(
            filter.evaluate(&event),
            Some(SkipReason::UnsupportedOperation)
        );
    }

    #[test]
    fn test_rejects_unknown_operation() {
        let filter = EventFilter::default();
        let event = event(
            r#"{"database":"solr_sync","table":"books","type":"bootstrap-insert","data":{"id":42}}"#,
        );

        assert_eq!(
            filter.evaluate(&event),
            Some(SkipReason::UnsupportedOperation)
        );
    }

    #[test]
    fn test_rejects_missing_row_payload() {
        let filter = EventFilter::default();
        let event = event(r#"{"database":"solr_sync","table":"books","type":"insert"}"#);

        assert_eq!(filter.evaluate(&event), Some(SkipReason::MissingRowId));
    }

    #[test]
    fn test_rejects_non_positive_row_id() {
        let filter = EventFilter::default();
        let event =
            event(r#"{"database":"solr_sync","table":"books","type":"insert","data":{"id":0}}"#);

        assert_eq!(filter.evaluate(&event), Some(SkipReason::MissingRowId));
    }

    #[test]
    fn test_database_check_runs_first() {
        // Wrong database on an unsupported table: the reason reported is the
        // database, matching the rule ordering.
        let filter = EventFilter::default();
        let event = event(r#"{"database":"other_db","table":"users","type":"delete"}"#);

        assert_eq!(filter.evaluate(&event), Some(SkipReason::ForeignDatabase));
    }

    #[test]
    fn test_custom_allow_list() {
        let filter = EventFilter::new("inventory", vec!["parts".to_string()]);
        let accepted =
            event(r#"{"database":"inventory","table":"parts","type":"insert","data":{"id":1}}"#);
        let rejected =
            event(r#"{"database":"inventory","table":"books","type":"insert","data":{"id":1}}"#);

        assert!(filter.accept(&accepted));
        assert!(!filter.accept(&rejected));
    }

    #[test]
    fn test_summary() {
        let summary = EventFilter::default().summary();
        assert!(summary.contains("database=solr_sync"));
        assert!(summary.contains("tables=books,electronics"));
    }
}

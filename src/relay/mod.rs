//! Relay processing pipeline
//!
//! This module holds the broker-free half of the relay: the event filter,
//! the solr-updater client, the per-message processor composing them, and
//! the pure retry policy. The `amqp` module drives these against live
//! deliveries and executes the resulting acknowledgment decisions.

pub mod filter;
pub mod notifier;
pub mod processor;
pub mod retry;

pub use filter::{EventFilter, SkipReason, SOURCE_DATABASE, SUPPORTED_TABLES};
pub use notifier::{UpdaterClient, UpdaterError, UpdaterResponse};
pub use processor::{EventProcessor, ProcessError, ProcessOutcome};
pub use retry::{RetryDecision, RetryPolicy};

//! Per-message processing pipeline
//!
//! One message body goes through decode → filter → notify and comes out as a
//! [`ProcessOutcome`]. The processor performs no broker I/O; acknowledgment
//! is decided and executed by the consumer layer on top of the outcome.

use crate::event::ChangeEvent;
use crate::relay::filter::{EventFilter, SkipReason};
use crate::relay::notifier::{UpdaterClient, UpdaterError, UpdaterResponse};
use thiserror::Error;
use tracing::{debug, error, info, warn};

/// Processing failures local to one message.
///
/// Both variants resolve through the retry policy; neither propagates to the
/// process level.
#[derive(Error, Debug)]
pub enum ProcessError {
    /// The message body was not a valid Maxwell event.
    #[error("malformed event payload: {0}")]
    Decode(#[from] serde_json::Error),

    /// The downstream call failed.
    #[error(transparent)]
    Updater(#[from] UpdaterError),
}

/// Result of one processing pass over one message.
#[derive(Debug)]
pub enum ProcessOutcome {
    /// The event was in scope and the downstream call succeeded.
    Synced(UpdaterResponse),
    /// The event was out of scope; skipping is a success path.
    Skipped(SkipReason),
    /// Decode or downstream failure; feeds the retry policy.
    Failed(ProcessError),
}

impl ProcessOutcome {
    /// Whether this outcome counts as a processing failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Drives one message body through the relay pipeline.
///
/// Holds no per-message state; a single processor instance is shared by all
/// in-flight message handlers.
pub struct EventProcessor {
    filter: EventFilter,
    updater: UpdaterClient,
}

impl EventProcessor {
    /// Creates a processor from its two collaborators.
    pub fn new(filter: EventFilter, updater: UpdaterClient) -> Self {
        Self { filter, updater }
    }

    /// Processes one raw message body.
    ///
    /// Never panics and never returns early without a definite outcome: the
    /// caller translates the outcome into exactly one acknowledgment action.
    pub async fn process(&self, payload: &[u8]) -> ProcessOutcome {
        let event = match ChangeEvent::decode(payload) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "failed to decode message body");
                return ProcessOutcome::Failed(err.into());
            }
        };

        if let Some(reason) = self.filter.evaluate(&event) {
            debug!(
                database = %event.database,
                table = %event.table,
                operation = %event.operation,
                reason = %reason,
                "skipping out-of-scope event"
            );
            return ProcessOutcome::Skipped(reason);
        }

        // The filter guarantees a usable identifier for accepted events.
        let Some(id) = event.row_id() else {
            return ProcessOutcome::Skipped(SkipReason::MissingRowId);
        };

        info!(
            table = %event.table,
            id = id,
            operation = %event.operation,
            "processing change event"
        );

        match self.updater.notify(&event.table, id).await {
            Ok(response) => {
                info!(
                    table = %event.table,
                    id = id,
                    status = response.status,
                    body = %response.body,
                    "synced row to Solr"
                );
                ProcessOutcome::Synced(response)
            }
            Err(err) => {
                error!(
                    table = %event.table,
                    id = id,
                    error = %err,
                    "failed to call solr-updater"
                );
                ProcessOutcome::Failed(err.into())
            }
        }
    }
}

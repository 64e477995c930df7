//! Work-queue consumer and acknowledgment execution
//!
//! This module drives the per-message state machine against live deliveries:
//! each message is processed by the relay pipeline, the retry policy turns
//! the outcome into exactly one acknowledgment decision, and the decision is
//! executed here: ack, republish-then-ack, or nack without requeue.
//!
//! Handlers run concurrently, one spawned task per delivery, bounded by the
//! broker's prefetch window. Each message's state machine is independent;
//! the only shared object is the channel handle used to acknowledge and
//! publish.

use crate::error::{RelayError, Result};
use crate::relay::{EventProcessor, RetryDecision, RetryPolicy};
use async_trait::async_trait;
use futures::StreamExt;
use lapin::message::Delivery;
use lapin::options::{
    BasicAckOptions, BasicCancelOptions, BasicConsumeOptions, BasicNackOptions,
    BasicPublishOptions,
};
use lapin::types::{AMQPValue, FieldTable, ShortString};
use lapin::{BasicProperties, Channel};
use metrics::increment_counter;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Consumer tag identifying this relay on the work queue.
const CONSUMER_TAG: &str = "solr-sync-relay";

/// Handler invoked once per delivered message.
///
/// Implementations must resolve every delivery to exactly one acknowledgment
/// action; returning without one stalls a prefetch slot until the connection
/// times it out.
#[async_trait]
pub trait DeliveryHandler: Send + Sync {
    /// Process one delivery end to end, acknowledgment included.
    async fn handle(&self, delivery: Delivery);
}

/// Extracts the delivery-attempt count from the `x-death` header.
///
/// The count is the `count` field of the first death record, the entry the
/// broker keeps current for the queue/reason pair that dead-lettered the
/// message most recently. Defaults to 0 for first deliveries or malformed
/// headers.
pub fn death_count(headers: Option<&FieldTable>) -> u64 {
    let Some(headers) = headers else { return 0 };

    let Some(AMQPValue::FieldArray(deaths)) =
        headers.inner().get(&ShortString::from("x-death"))
    else {
        return 0;
    };

    let Some(AMQPValue::FieldTable(death)) = deaths.as_slice().first() else {
        return 0;
    };

    match death.inner().get(&ShortString::from("count")) {
        Some(AMQPValue::LongLongInt(count)) => (*count).max(0) as u64,
        Some(AMQPValue::LongInt(count)) => (*count).max(0) as u64,
        Some(AMQPValue::LongUInt(count)) => u64::from(*count),
        _ => 0,
    }
}

/// Executes the relay pipeline and acknowledgment decision for one message.
pub struct RelayHandler {
    channel: Channel,
    processor: EventProcessor,
    policy: RetryPolicy,
    retry_exchange: String,
    shutting_down: Arc<AtomicBool>,
}

impl RelayHandler {
    /// Creates a handler sharing the connection manager's channel and
    /// shutdown flag.
    pub fn new(
        channel: Channel,
        processor: EventProcessor,
        policy: RetryPolicy,
        retry_exchange: String,
        shutting_down: Arc<AtomicBool>,
    ) -> Self {
        Self {
            channel,
            processor,
            policy,
            retry_exchange,
            shutting_down,
        }
    }

    /// Publishes a copy of the message to the retry route.
    ///
    /// The body is republished byte-for-byte and the original headers are
    /// preserved so the broker's death history keeps accumulating across
    /// redeliveries. Delivery is marked persistent.
    async fn republish(&self, delivery: &Delivery) -> std::result::Result<(), lapin::Error> {
        let mut properties = BasicProperties::default().with_delivery_mode(2);
        if let Some(headers) = delivery.properties.headers() {
            properties = properties.with_headers(headers.clone());
        }

        self.channel
            .basic_publish(
                &self.retry_exchange,
                "",
                BasicPublishOptions::default(),
                &delivery.data,
                properties,
            )
            .await?
            .await?;

        Ok(())
    }

    /// Logs an acknowledgment failure.
    ///
    /// During teardown the channel closes underneath in-flight handlers and
    /// pending acknowledgments fail; that is expected and must not be
    /// reported as an error.
    fn ack_failure(&self, action: &str, err: &lapin::Error) {
        if self.shutting_down.load(Ordering::SeqCst) {
            debug!(action = action, error = %err, "acknowledgment failed during shutdown");
        } else {
            warn!(action = action, error = %err, "acknowledgment failed");
        }
    }

    /// Executes one acknowledgment decision against the broker.
    async fn execute(&self, decision: RetryDecision, delivery: Delivery, attempts: u64) {
        match decision {
            RetryDecision::Ack => {
                if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
                    self.ack_failure("ack", &err);
                }
            }
            RetryDecision::RetryRepublish => {
                info!(
                    attempts = attempts,
                    limit = self.policy.limit(),
                    exchange = %self.retry_exchange,
                    "republishing message to retry route"
                );
                match self.republish(&delivery).await {
                    // The original is acknowledged only once the copy is
                    // safely published; the reverse order could lose the
                    // message if the publish failed.
                    Ok(()) => {
                        if let Err(err) = delivery.ack(BasicAckOptions::default()).await {
                            self.ack_failure("ack", &err);
                        }
                    }
                    Err(err) => {
                        error!(error = %err, "republish failed, dead-lettering message");
                        if let Err(err) = delivery
                            .nack(BasicNackOptions {
                                requeue: false,
                                ..BasicNackOptions::default()
                            })
                            .await
                        {
                            self.ack_failure("nack", &err);
                        }
                    }
                }
            }
            RetryDecision::DeadLetter => {
                warn!(
                    attempts = attempts,
                    limit = self.policy.limit(),
                    "retry budget exhausted, dead-lettering message"
                );
                if let Err(err) = delivery
                    .nack(BasicNackOptions {
                        requeue: false,
                        ..BasicNackOptions::default()
                    })
                    .await
                {
                    self.ack_failure("nack", &err);
                }
            }
        }
    }
}

#[async_trait]
impl DeliveryHandler for RelayHandler {
    async fn handle(&self, delivery: Delivery) {
        let attempts = death_count(delivery.properties.headers().as_ref());
        let outcome = self.processor.process(&delivery.data).await;
        let decision = self.policy.decide(&outcome, attempts);

        debug!(
            attempts = attempts,
            decision = decision.as_str(),
            "executing acknowledgment decision"
        );
        increment_counter!("solr_sync_messages_total", "decision" => decision.as_str());

        self.execute(decision, delivery, attempts).await;
    }
}

/// Owns the queue subscription and dispatches deliveries to the handler.
pub struct ConsumerLoop {
    channel: Channel,
    queue: String,
    shutting_down: Arc<AtomicBool>,
}

impl ConsumerLoop {
    /// Creates a consumer loop over the given queue.
    pub fn new(channel: Channel, queue: String, shutting_down: Arc<AtomicBool>) -> Self {
        Self {
            channel,
            queue,
            shutting_down,
        }
    }

    /// Consumes the work queue until the subscription ends.
    ///
    /// Each delivery is handed to its own spawned task; the prefetch limit
    /// bounds how many run at once. Returns `Ok(())` when the subscription
    /// ends during a deliberate shutdown, and an error when the stream fails
    /// outside one, which the caller treats as fatal.
    ///
    /// # Errors
    ///
    /// Returns `RelayError::ShutdownInProgress` when called during shutdown
    /// and `RelayError::ConnectionLost` when the delivery stream breaks
    /// unexpectedly.
    pub async fn run(&self, handler: Arc<dyn DeliveryHandler>) -> Result<()> {
        if self.shutting_down.load(Ordering::SeqCst) {
            return Err(RelayError::ShutdownInProgress.into());
        }

        let mut consumer = self
            .channel
            .basic_consume(
                &self.queue,
                CONSUMER_TAG,
                BasicConsumeOptions::default(),
                FieldTable::default(),
            )
            .await
            .map_err(RelayError::Amqp)?;

        info!(queue = %self.queue, "waiting for messages");

        while let Some(delivery) = consumer.next().await {
            match delivery {
                Ok(delivery) => {
                    let handler = handler.clone();
                    tokio::spawn(async move {
                        handler.handle(delivery).await;
                    });
                }
                Err(err) => {
                    if self.shutting_down.load(Ordering::SeqCst) {
                        debug!(error = %err, "consumer stream ended during shutdown");
                        break;
                    }
                    error!(error = %err, "consumer stream failed");
                    return Err(RelayError::ConnectionLost.into());
                }
            }
        }

        Ok(())
    }

    /// Cancels the subscription so no further deliveries arrive.
    ///
    /// Part of the shutdown sequence; failures are logged and swallowed so
    /// teardown proceeds to closing the channel regardless.
    pub async fn stop(&self) {
        if let Err(err) = self
            .channel
            .basic_cancel(CONSUMER_TAG, BasicCancelOptions::default())
            .await
        {
            warn!(error = %err, "failed to cancel consumer");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lapin::types::FieldArray;

    fn death_headers(count: AMQPValue) -> FieldTable {
        let mut death = FieldTable::default();
        death.insert("count".into(), count);
        death.insert("queue".into(), AMQPValue::LongString("solr.sync.v1".into()));
        death.insert("reason".into(), AMQPValue::LongString("rejected".into()));

        let mut headers = FieldTable::default();
        headers.insert(
            "x-death".into(),
            AMQPValue::FieldArray(FieldArray::from(vec![AMQPValue::FieldTable(death)])),
        );
        headers
    }

    #[test]
    fn test_death_count_no_headers() {
        assert_eq!(death_count(None), 0);
    }

    #[test]
    fn test_death_count_empty_headers() {
        assert_eq!(death_count(Some(&FieldTable::default())), 0);
    }

    #[test]
    fn test_death_count_first_entry() {
        let headers = death_headers(AMQPValue::LongLongInt(3));
        assert_eq!(death_count(Some(&headers)), 3);
    }

    #[test]
    fn test_death_count_long_int() {
        let headers = death_headers(AMQPValue::LongInt(2));
        assert_eq!(death_count(Some(&headers)), 2);
    }

    #[test]
    fn test_death_count_negative_clamps_to_zero() {
        let headers = death_headers(AMQPValue::LongLongInt(-1));
        assert_eq!(death_count(Some(&headers)), 0);
    }

    #[test]
    fn test_death_count_missing_count_field() {
        let mut death = FieldTable::default();
        death.insert("queue".into(), AMQPValue::LongString("solr.sync.v1".into()));

        let mut headers = FieldTable::default();
        headers.insert(
            "x-death".into(),
            AMQPValue::FieldArray(FieldArray::from(vec![AMQPValue::FieldTable(death)])),
        );

        assert_eq!(death_count(Some(&headers)), 0);
    }

    #[test]
    fn test_death_count_empty_death_array() {
        let mut headers = FieldTable::default();
        headers.insert(
            "x-death".into(),
            AMQPValue::FieldArray(FieldArray::default()),
        );

        assert_eq!(death_count(Some(&headers)), 0);
    }

    #[test]
    fn test_death_count_wrong_header_type() {
        let mut headers = FieldTable::default();
        headers.insert("x-death".into(), AMQPValue::LongString("bogus".into()));

        assert_eq!(death_count(Some(&headers)), 0);
    }

    #[test]
    fn test_death_count_uses_first_of_multiple_entries() {
        let mut first = FieldTable::default();
        first.insert("count".into(), AMQPValue::LongLongInt(4));
        let mut second = FieldTable::default();
        second.insert("count".into(), AMQPValue::LongLongInt(9));

        let mut headers = FieldTable::default();
        headers.insert(
            "x-death".into(),
            AMQPValue::FieldArray(FieldArray::from(vec![
                AMQPValue::FieldTable(first),
                AMQPValue::FieldTable(second),
            ])),
        );

        assert_eq!(death_count(Some(&headers)), 4);
    }
}

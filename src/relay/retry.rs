//! Bounded-retry decision logic
//!
//! Pure decision function, no I/O. The attempt count is broker-maintained
//! (dead-letter redelivery history), so the relay stays stateless between
//! messages and the retry bound survives process restarts for free.

use crate::relay::processor::ProcessOutcome;

/// Acknowledgment action for one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Acknowledge on the original queue; processing is finished.
    Ack,
    /// Publish a copy to the retry route, then acknowledge the original.
    RetryRepublish,
    /// Negative-acknowledge without requeue; the DLX captures the message.
    DeadLetter,
}

impl RetryDecision {
    /// Returns a short label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ack => "ack",
            Self::RetryRepublish => "retry_republish",
            Self::DeadLetter => "dead_letter",
        }
    }
}

/// Retry policy bounded by a delivery-attempt limit.
///
/// # Example
///
/// ```
/// use solr_sync::relay::{RetryDecision, RetryPolicy};
///
/// let policy = RetryPolicy::new(5);
/// assert_eq!(policy.decide_for(false, 0), RetryDecision::Ack);
/// assert_eq!(policy.decide_for(true, 2), RetryDecision::RetryRepublish);
/// assert_eq!(policy.decide_for(true, 5), RetryDecision::DeadLetter);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    limit: u64,
}

impl RetryPolicy {
    /// Creates a policy that dead-letters after `limit` prior attempts.
    pub fn new(limit: u64) -> Self {
        Self { limit }
    }

    /// Returns the configured attempt limit.
    pub fn limit(&self) -> u64 {
        self.limit
    }

    /// Decides the acknowledgment action for one processing outcome.
    pub fn decide(&self, outcome: &ProcessOutcome, attempts: u64) -> RetryDecision {
        self.decide_for(outcome.is_failure(), attempts)
    }

    /// Core decision on the (failed, attempts) pair.
    pub fn decide_for(&self, failed: bool, attempts: u64) -> RetryDecision {
        if !failed {
            RetryDecision::Ack
        } else if attempts >= self.limit {
            RetryDecision::DeadLetter
        } else {
            RetryDecision::RetryRepublish
        }
    }
}

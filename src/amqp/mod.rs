//! RabbitMQ plumbing
//!
//! Connection/channel lifecycle and the consume loop that executes
//! acknowledgment decisions. Everything broker-specific lives here; the
//! `relay` module stays free of AMQP types apart from the delivery payload
//! bytes it processes.

pub mod connection;
pub mod consumer;

pub use connection::ConnectionManager;
pub use consumer::{death_count, ConsumerLoop, DeliveryHandler, RelayHandler};

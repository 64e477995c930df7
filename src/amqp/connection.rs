//! RabbitMQ connection lifecycle
//!
//! This module owns the broker connection and the single multiplexed channel
//! everything else acknowledges and publishes on. Queue topology (retry
//! route, dead-letter exchange) is provisioned externally; the connection
//! manager only verifies the work queue exists and configures the prefetch
//! window that bounds in-flight deliveries.
//!
//! Connection loss outside a deliberate shutdown is fatal: operating without
//! a connection would silently mask message loss, so the error is forwarded
//! to the run loop, which exits non-zero.

use crate::config::RabbitConfig;
use crate::error::{RelayError, Result};
use anyhow::Context;
use lapin::options::{BasicQosOptions, QueueDeclareOptions};
use lapin::types::FieldTable;
use lapin::{Channel, Connection, ConnectionProperties};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Owns the broker connection, its single channel, and shutdown sequencing.
pub struct ConnectionManager {
    connection: Connection,
    channel: Channel,
    shutting_down: Arc<AtomicBool>,
}

impl ConnectionManager {
    /// Establishes the connection and channel, verifies the work queue, and
    /// applies the prefetch limit.
    ///
    /// Returns the manager plus a receiver that yields at most one error:
    /// the first connection failure observed outside a deliberate shutdown.
    ///
    /// # Errors
    ///
    /// Returns an error when the broker is unreachable, the work queue does
    /// not exist (passive declare), or channel setup fails.
    pub async fn connect(config: &RabbitConfig) -> Result<(Self, mpsc::Receiver<lapin::Error>)> {
        info!(
            host = %config.host,
            port = config.port,
            vhost = %config.vhost,
            "connecting to RabbitMQ"
        );

        let connection = Connection::connect(&config.amqp_uri(), ConnectionProperties::default())
            .await
            .map_err(RelayError::Amqp)
            .context("failed to connect to RabbitMQ")?;

        let shutting_down = Arc::new(AtomicBool::new(false));
        let (error_tx, error_rx) = mpsc::channel(1);
        {
            let shutting_down = shutting_down.clone();
            connection.on_error(move |err| {
                if shutting_down.load(Ordering::SeqCst) {
                    debug!(error = %err, "connection error during shutdown");
                } else {
                    error!(error = %err, "RabbitMQ connection error");
                    let _ = error_tx.try_send(err);
                }
            });
        }

        let channel = connection
            .create_channel()
            .await
            .map_err(RelayError::Amqp)
            .context("failed to open AMQP channel")?;

        // The queue carries DLX settings provisioned externally; a passive
        // declare verifies existence without re-asserting its arguments.
        channel
            .queue_declare(
                &config.queue,
                QueueDeclareOptions {
                    passive: true,
                    ..QueueDeclareOptions::default()
                },
                FieldTable::default(),
            )
            .await
            .map_err(RelayError::Amqp)
            .with_context(|| format!("work queue '{}' does not exist", config.queue))?;

        channel
            .basic_qos(config.prefetch, BasicQosOptions::default())
            .await
            .map_err(RelayError::Amqp)
            .context("failed to set prefetch")?;

        info!(
            queue = %config.queue,
            prefetch = config.prefetch,
            "connected to RabbitMQ"
        );

        Ok((
            Self {
                connection,
                channel,
                shutting_down,
            },
            error_rx,
        ))
    }

    /// Returns a handle to the multiplexed channel.
    pub fn channel(&self) -> Channel {
        self.channel.clone()
    }

    /// Returns the flag that marks a deliberate shutdown as in progress.
    ///
    /// Handlers consult it to downgrade acknowledgment failures during
    /// teardown from warnings to debug noise.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        self.shutting_down.clone()
    }

    /// Whether a deliberate shutdown has begun.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }

    /// Closes the channel and connection.
    ///
    /// Idempotent: a second call while one is in progress is a no-op. Close
    /// errors are logged and swallowed; shutdown must complete regardless.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            debug!("shutdown already in progress");
            return;
        }

        info!("shutting down");

        if let Err(err) = self.channel.close(200, "shutdown").await {
            warn!(error = %err, "failed to close AMQP channel");
        }

        if let Err(err) = self.connection.close(200, "shutdown").await {
            warn!(error = %err, "failed to close AMQP connection");
        }
    }
}

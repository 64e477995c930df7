//! Error types for solr-sync
//!
//! This module defines the process-level error types used throughout the
//! relay, using `thiserror` for ergonomic error handling. Per-message
//! failures (decode errors, downstream call failures) live next to the code
//! that produces them and are resolved through the retry policy; only the
//! errors that can end the process are collected here.

use thiserror::Error;

/// Process-level error type for the relay
///
/// Per-message errors never reach this enum: they are absorbed by the
/// acknowledgment decision for the message that produced them. Anything that
/// surfaces here terminates the process with a non-zero exit code.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Broker protocol or channel errors
    #[error("AMQP error: {0}")]
    Amqp(#[from] lapin::Error),

    /// The broker connection dropped outside a deliberate shutdown
    #[error("RabbitMQ connection lost")]
    ConnectionLost,

    /// An operation was requested while shutdown was already in progress
    #[error("Shutdown in progress")]
    ShutdownInProgress,

    /// HTTP client construction errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for solr-sync operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let error = RelayError::Config("invalid prefetch".to_string());
        assert_eq!(error.to_string(), "Configuration error: invalid prefetch");
    }

    #[test]
    fn test_connection_lost_display() {
        let error = RelayError::ConnectionLost;
        assert_eq!(error.to_string(), "RabbitMQ connection lost");
    }

    #[test]
    fn test_shutdown_in_progress_display() {
        let error = RelayError::ShutdownInProgress;
        assert_eq!(error.to_string(), "Shutdown in progress");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let error: RelayError = io_error.into();
        assert!(matches!(error, RelayError::Io(_)));
    }

    #[test]
    fn test_amqp_error_conversion() {
        let amqp_error = lapin::Error::ChannelsLimitReached;
        let error: RelayError = amqp_error.into();
        assert!(matches!(error, RelayError::Amqp(_)));
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<RelayError>();
    }
}

//! Command-line interface definition for solr-sync
//!
//! This module defines the CLI structure using clap's derive API. Every
//! option is backed by the environment variable the deployment sets, with
//! the flag form available for local runs; defaults match a stock local
//! RabbitMQ and solr-updater.

use clap::Parser;

/// solr-sync - Maxwell-to-Solr change-data-capture relay
///
/// Consumes row-change events from a RabbitMQ work queue and triggers
/// re-indexing in the solr-updater service for each qualifying row.
#[derive(Parser, Debug, Clone)]
#[command(name = "solr-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// RabbitMQ host
    #[arg(long, env = "RABBITMQ_HOST", default_value = "localhost")]
    pub rabbit_host: String,

    /// RabbitMQ port
    #[arg(long, env = "RABBITMQ_PORT", default_value_t = 5672)]
    pub rabbit_port: u16,

    /// RabbitMQ username
    #[arg(long, env = "RABBITMQ_USER", default_value = "guest")]
    pub rabbit_user: String,

    /// RabbitMQ password
    #[arg(long, env = "RABBITMQ_PASSWORD", default_value = "guest", hide_env_values = true)]
    pub rabbit_password: String,

    /// RabbitMQ virtual host
    #[arg(long, env = "RABBITMQ_VHOST", default_value = "/")]
    pub rabbit_vhost: String,

    /// Work queue to consume (pre-provisioned with DLX settings)
    #[arg(long, env = "RABBITMQ_QUEUE", default_value = "solr.sync.v1")]
    pub queue: String,

    /// Maximum unacknowledged deliveries held at once
    #[arg(long, env = "RABBITMQ_PREFETCH", default_value_t = 10)]
    pub prefetch: u16,

    /// Exchange failed messages are republished to for delayed redelivery
    #[arg(long, env = "RABBITMQ_RETRY_EXCHANGE", default_value = "solr.sync.retry")]
    pub retry_exchange: String,

    /// Delivery attempts before a message is dead-lettered
    #[arg(long, env = "RETRY_LIMIT", default_value_t = 5)]
    pub retry_limit: u64,

    /// Base URL of the solr-updater service
    #[arg(long, env = "SOLR_UPDATER_BASE_URL", default_value = "http://localhost:8080")]
    pub updater_base_url: String,

    /// Timeout for one solr-updater call, in milliseconds
    #[arg(long, env = "SOLR_UPDATER_TIMEOUT", default_value_t = 30_000)]
    pub updater_timeout_ms: u64,

    /// Emit logs as JSON instead of human-readable lines
    #[arg(long, env = "LOG_JSON")]
    pub json_logs: bool,
}

impl Cli {
    /// Parse command line arguments
    ///
    /// # Returns
    ///
    /// Returns the parsed CLI structure
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

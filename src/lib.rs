//! solr-sync - Maxwell-to-Solr change-data-capture relay library
//!
//! This library provides the core functionality for the solr-sync relay:
//! consuming Maxwell row-change events from a RabbitMQ work queue, filtering
//! them to the supported database/tables, triggering re-indexing through the
//! solr-updater service, and resolving every message through a bounded
//! retry/dead-letter state machine.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `amqp`: connection/channel lifecycle and the consume loop
//! - `relay`: event filter, downstream notifier, processor, retry policy
//! - `event`: decoded Maxwell change-event types
//! - `config`: configuration sections and validation
//! - `cli`: command-line/environment interface definition
//! - `error`: process-level error types and result alias
//!
//! # Example
//!
//! ```no_run
//! use clap::Parser;
//! use solr_sync::cli::Cli;
//! use solr_sync::config::Config;
//!
//! let config = Config::from_cli(&Cli::try_parse_from(["solr-sync"]).unwrap());
//! config.validate().unwrap();
//! ```

pub mod amqp;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod relay;

// Re-export commonly used types
pub use amqp::{ConnectionManager, ConsumerLoop, DeliveryHandler, RelayHandler};
pub use config::Config;
pub use error::{RelayError, Result};
pub use event::{ChangeEvent, Operation};
pub use relay::{EventFilter, EventProcessor, RetryDecision, RetryPolicy, UpdaterClient};

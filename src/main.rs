//! solr-sync - Maxwell-to-Solr change-data-capture relay
//!
//! Main entry point: parses configuration, connects to RabbitMQ, runs the
//! consumer until a shutdown signal or a fatal connection loss, and exits 0
//! only after a graceful teardown.

use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use solr_sync::amqp::{ConnectionManager, ConsumerLoop, DeliveryHandler, RelayHandler};
use solr_sync::cli::Cli;
use solr_sync::config::Config;
use solr_sync::error::RelayError;
use solr_sync::relay::{EventFilter, EventProcessor, RetryPolicy, UpdaterClient};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();
    init_tracing(cli.json_logs);

    let config = Config::from_cli(&cli);
    config.validate()?;

    run(config).await
}

async fn run(config: Config) -> Result<()> {
    let filter = EventFilter::default();
    info!(
        queue = %config.rabbit.queue,
        prefetch = config.rabbit.prefetch,
        updater = %config.updater.base_url,
        retry_limit = config.retry.limit,
        retry_exchange = %config.retry.exchange,
        filters = %filter.summary(),
        "starting solr-sync relay"
    );

    let (manager, mut connection_errors) = ConnectionManager::connect(&config.rabbit).await?;

    let updater = UpdaterClient::new(&config.updater)
        .map_err(RelayError::Http)
        .context("failed to build solr-updater client")?;
    let processor = EventProcessor::new(filter, updater);
    let policy = RetryPolicy::new(config.retry.limit);

    let handler: Arc<dyn DeliveryHandler> = Arc::new(RelayHandler::new(
        manager.channel(),
        processor,
        policy,
        config.retry.exchange.clone(),
        manager.shutdown_flag(),
    ));

    let consumer = Arc::new(ConsumerLoop::new(
        manager.channel(),
        config.rabbit.queue.clone(),
        manager.shutdown_flag(),
    ));

    let mut consume_task = {
        let consumer = consumer.clone();
        tokio::spawn(async move { consumer.run(handler).await })
    };

    let mut sigterm = signal(SignalKind::terminate()).context("failed to install SIGTERM handler")?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!(signal = "SIGINT", "received shutdown signal");
        }
        _ = sigterm.recv() => {
            info!(signal = "SIGTERM", "received shutdown signal");
        }
        Some(err) = connection_errors.recv() => {
            error!(error = %err, "connection lost outside shutdown, exiting");
            return Err(RelayError::ConnectionLost.into());
        }
        result = &mut consume_task => {
            let err = match result {
                Ok(Ok(())) => anyhow!("consumer subscription ended unexpectedly"),
                Ok(Err(err)) => err,
                Err(join_err) => anyhow!("consumer task failed: {join_err}"),
            };
            error!(error = %err, "consumer terminated outside shutdown, exiting");
            return Err(err);
        }
    }

    // Graceful path: stop deliveries, tear the connection down, let the
    // consume loop drain out. In-flight handlers whose acknowledgments race
    // the teardown log and tolerate the failure.
    consumer.stop().await;
    manager.shutdown().await;
    let _ = consume_task.await;

    info!("shutdown complete");
    Ok(())
}

/// Initialize tracing subscriber with environment filter
fn init_tracing(json_logs: bool) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("solr_sync=info"));

    let registry = tracing_subscriber::registry().with(env_filter);

    if json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

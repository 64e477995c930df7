//! HTTP client for the solr-updater service
//!
//! This module issues the downstream re-indexing call for one qualifying
//! change event: a single `POST <base-url>/<table>/<id>` with an empty JSON
//! body and one configured timeout. Retrying is the caller's responsibility;
//! every failure is surfaced unmodified.

use crate::config::UpdaterConfig;
use reqwest::Client;
use thiserror::Error;
use tracing::debug;

/// Failure causes for one downstream call.
///
/// The variants map one-to-one onto the retry policy's inputs: all of them
/// are processing failures, distinguished only for observability.
#[derive(Error, Debug)]
pub enum UpdaterError {
    /// The configured request timeout elapsed.
    #[error("solr-updater request timed out")]
    Timeout,

    /// The request never produced an HTTP response.
    #[error("solr-updater transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The service answered with a non-2xx status.
    #[error("solr-updater returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for log reconstruction.
        body: String,
    },
}

/// Successful downstream response.
#[derive(Debug, Clone)]
pub struct UpdaterResponse {
    /// HTTP status code (2xx).
    pub status: u16,
    /// Raw response body.
    pub body: String,
}

/// Client for triggering re-indexing in the solr-updater service.
///
/// # Example
///
/// ```no_run
/// use solr_sync::config::UpdaterConfig;
/// use solr_sync::relay::UpdaterClient;
///
/// # async fn example() -> anyhow::Result<()> {
/// let client = UpdaterClient::new(&UpdaterConfig {
///     base_url: "http://localhost:8080".to_string(),
///     timeout_ms: 30_000,
/// })?;
/// let response = client.notify("books", 42).await?;
/// assert!(response.status < 300);
/// # Ok(())
/// # }
/// ```
pub struct UpdaterClient {
    client: Client,
    base_url: String,
}

impl UpdaterClient {
    /// Creates a new client with the configured timeout baked in.
    ///
    /// # Errors
    ///
    /// Returns the underlying `reqwest` error if the HTTP client cannot be
    /// created.
    pub fn new(config: &UpdaterConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.timeout()).build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Builds the deterministic endpoint for a table/row pair.
    fn endpoint(&self, table: &str, id: i64) -> String {
        format!("{}/{}/{}", self.base_url, table, id)
    }

    /// Triggers re-indexing of one row.
    ///
    /// Issues exactly one call; no internal retries.
    ///
    /// # Errors
    ///
    /// Returns [`UpdaterError::Timeout`] when the configured timeout elapses,
    /// [`UpdaterError::Transport`] when no HTTP response was produced, and
    /// [`UpdaterError::Status`] for any non-2xx answer.
    pub async fn notify(&self, table: &str, id: i64) -> Result<UpdaterResponse, UpdaterError> {
        let url = self.endpoint(table, id);
        debug!(url = %url, "calling solr-updater");

        let response = self
            .client
            .post(&url)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    UpdaterError::Timeout
                } else {
                    UpdaterError::Transport(err)
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if status.is_success() {
            Ok(UpdaterResponse {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(UpdaterError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

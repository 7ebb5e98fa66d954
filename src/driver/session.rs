//! WebDriver session bootstrap.
//!
//! Thin wrapper over the fantoccini client: derive capabilities from the
//! resolved settings, negotiate a session at `remote_url`, hand the live
//! client to the test scripts. The driver server owns everything past
//! session start (retries, command timeouts, teardown on disconnect).

use fantoccini::{Client, ClientBuilder};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{DriverCapabilities, Settings};

/// Errors that can occur while opening or closing a driver session.
#[derive(Debug, Error)]
pub enum DriverError {
    /// Session negotiation with the remote driver server failed.
    #[error("Failed to open driver session at {url}: {source}")]
    Session {
        url: String,
        #[source]
        source: fantoccini::error::NewSessionError,
    },

    /// A driver command failed after the session was established.
    #[error("Driver command failed: {0}")]
    Command(#[from] fantoccini::error::CmdError),
}

/// A live driver session against the configured remote endpoint.
///
/// One session per derived capability set; sessions share no state, so the
/// surrounding test framework may open several in parallel.
pub struct DriverSession {
    client: Client,
    remote_url: String,
}

impl DriverSession {
    /// Derives capabilities from `settings` and opens a session at its
    /// `remote_url`.
    pub async fn connect(settings: &Settings) -> Result<Self, DriverError> {
        let caps = DriverCapabilities::derive(settings);
        debug!(capabilities = %serde_json::Value::Object(caps.as_map().clone()), "derived driver capabilities");
        info!(url = %settings.remote_url, context = %settings.context, "opening driver session");

        let client = ClientBuilder::native()
            .capabilities(caps.into_map())
            .connect(&settings.remote_url)
            .await
            .map_err(|source| DriverError::Session {
                url: settings.remote_url.clone(),
                source,
            })?;

        info!(url = %settings.remote_url, "driver session established");
        Ok(Self {
            client,
            remote_url: settings.remote_url.clone(),
        })
    }

    /// The underlying WebDriver client, for test scripts.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The remote endpoint this session was opened against.
    pub fn remote_url(&self) -> &str {
        &self.remote_url
    }

    /// Ends the session and releases the remote device.
    pub async fn quit(self) -> Result<(), DriverError> {
        info!(url = %self.remote_url, "closing driver session");
        self.client.close().await?;
        Ok(())
    }
}

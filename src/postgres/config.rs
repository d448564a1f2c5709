use std::str::FromStr;
use std::time::Duration;

use postgres::NoTls;
use serde::Deserialize;

use crate::connection::DbConnection;
use crate::error::SqlAccessError;
use crate::source::ConnectionSource;

/// Options for opening Postgres connections.
#[derive(Debug, Clone, Deserialize)]
pub struct PostgresOptions {
    /// libpq-style connection string or `postgres://` URL.
    pub url: String,
    #[serde(default)]
    pub application_name: Option<String>,
    #[serde(default)]
    pub connect_timeout_ms: Option<u64>,
}

impl PostgresOptions {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            application_name: None,
            connect_timeout_ms: None,
        }
    }

    /// Parse into a driver config, applying the overrides.
    ///
    /// # Errors
    ///
    /// Returns `SqlAccessError::ConfigError` if the connection string is malformed.
    pub fn to_config(&self) -> Result<postgres::Config, SqlAccessError> {
        let mut config = postgres::Config::from_str(&self.url)
            .map_err(|e| SqlAccessError::ConfigError(format!("invalid postgres url: {e}")))?;
        if let Some(name) = &self.application_name {
            config.application_name(name);
        }
        if let Some(ms) = self.connect_timeout_ms {
            config.connect_timeout(Duration::from_millis(ms));
        }
        Ok(config)
    }
}

/// Fluent builder for Postgres options.
#[derive(Debug, Clone)]
pub struct PostgresOptionsBuilder {
    opts: PostgresOptions,
}

impl PostgresOptionsBuilder {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            opts: PostgresOptions::new(url),
        }
    }

    #[must_use]
    pub fn application_name(mut self, name: impl Into<String>) -> Self {
        self.opts.application_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.opts.connect_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    #[must_use]
    pub fn finish(self) -> PostgresOptions {
        self.opts
    }

    #[must_use]
    pub fn build(self) -> PostgresSource {
        PostgresSource::new(self.finish())
    }
}

/// Opens one Postgres client per acquire.
#[derive(Debug, Clone)]
pub struct PostgresSource {
    opts: PostgresOptions,
}

impl PostgresSource {
    #[must_use]
    pub fn new(opts: PostgresOptions) -> Self {
        Self { opts }
    }

    #[must_use]
    pub fn builder(url: impl Into<String>) -> PostgresOptionsBuilder {
        PostgresOptionsBuilder::new(url)
    }

    #[must_use]
    pub fn options(&self) -> &PostgresOptions {
        &self.opts
    }

    /// Connect a new client.
    ///
    /// # Errors
    ///
    /// `ConfigError` for a malformed url, `ConnectionError` if the server is unreachable.
    pub fn connect(&self) -> Result<postgres::Client, SqlAccessError> {
        self.opts
            .to_config()?
            .connect(NoTls)
            .map_err(|e| SqlAccessError::ConnectionError(format!("Failed to connect to Postgres: {e}")))
    }
}

impl ConnectionSource for PostgresSource {
    fn acquire(&self) -> Result<DbConnection, SqlAccessError> {
        self.connect().map(DbConnection::postgres)
    }
}

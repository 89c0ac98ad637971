use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{StoreError, StoreResult};

/// Connection settings for [`PersistentStore`](super::PersistentStore).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PersistentConfig {
    pub host: String,
    pub port: u16,
    /// Logical Redis database number.
    pub database: i64,
    pub username: Option<String>,
    /// File holding the password. The secret itself never appears in config.
    pub password_file: Option<PathBuf>,
    pub dial_timeout: Duration,
    /// Deadline for one store call, retries included.
    pub call_timeout: Duration,
    pub max_retries: usize,
    pub min_retry_backoff: Duration,
    pub max_retry_backoff: Duration,
    /// Upper bound on both idle and in-flight connections.
    pub pool_size: usize,
}

impl PersistentConfig {
    /// Settings for `host:port` with the default timeouts and pool size.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            database: 0,
            username: None,
            password_file: None,
            dial_timeout: Duration::from_secs(3),
            call_timeout: Duration::from_secs(20),
            max_retries: 3,
            min_retry_backoff: Duration::from_secs(1),
            max_retry_backoff: Duration::from_secs(2),
            pool_size: default_pool_size(),
        }
    }

    pub fn with_database(mut self, database: i64) -> Self {
        self.database = database;
        self
    }

    /// Set the username. An empty string means none.
    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        let username = username.into();
        self.username = (!username.is_empty()).then_some(username);
        self
    }

    pub fn with_password_file(mut self, path: impl AsRef<Path>) -> Self {
        self.password_file = Some(path.as_ref().to_path_buf());
        self
    }

    /// Read the password file, dropping a trailing line break.
    pub fn read_password(&self) -> StoreResult<Option<String>> {
        let Some(path) = &self.password_file else {
            return Ok(None);
        };
        let content = std::fs::read_to_string(path).map_err(|source| StoreError::Credentials {
            path: path.clone(),
            source,
        })?;
        Ok(Some(content.trim_end_matches(['\r', '\n']).to_owned()))
    }

    /// `redis://` URL for this config, credentials percent-encoded.
    pub(crate) fn connection_url(&self) -> StoreResult<url::Url> {
        let base = format!("redis://{}:{}/{}", self.host, self.port, self.database);
        let mut url = url::Url::parse(&base)
            .map_err(|e| StoreError::InvalidAddress(format!("{}:{}: {e}", self.host, self.port)))?;
        if let Some(username) = &self.username {
            url.set_username(username)
                .map_err(|()| StoreError::InvalidAddress(format!("username {username:?}")))?;
        }
        if let Some(password) = self.read_password()? {
            url.set_password(Some(&password))
                .map_err(|()| StoreError::InvalidAddress("password".into()))?;
        }
        Ok(url)
    }

    /// Address without credentials, for logs.
    pub fn display_addr(&self) -> String {
        format!("{}:{}/{}", self.host, self.port, self.database)
    }
}

/// Ten connections per available CPU.
pub fn default_pool_size() -> usize {
    let cpus = std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1);
    10 * cpus
}

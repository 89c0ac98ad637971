use std::path::{Path, PathBuf};

use blobstate_store::PersistentConfig;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Largest accepted request body: 32 MiB.
pub const BODY_SIZE_LIMIT: usize = 32 * 1024 * 1024;

/// Environment variables read by [`ServerConfig::load`], lowercased to
/// their field names.
pub const ENV_KEYS: &[&str] = &[
    "env_name",
    "host",
    "port",
    "log_level",
    "color",
    "db_host",
    "db_port",
    "db_name",
    "db_username",
    "db_password",
];

/// Deployment environment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Testing,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Testing => write!(f, "testing"),
            Self::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub env_name: Environment,
    pub host: String,
    pub port: u16,
    /// Default tracing filter when `RUST_LOG` is unset.
    pub log_level: String,
    /// Heading colour of the index page.
    pub color: String,
    /// Redis host. Empty selects the in-memory store.
    pub db_host: String,
    pub db_port: u16,
    /// Logical Redis database number.
    pub db_name: i64,
    pub db_username: String,
    /// Path of the file holding the Redis password.
    pub db_password: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            env_name: Environment::Development,
            host: "127.0.0.1".into(),
            port: 3000,
            log_level: "info".into(),
            color: "black".into(),
            db_host: String::new(),
            db_port: 6379,
            db_name: 0,
            db_username: String::new(),
            db_password: String::new(),
        }
    }
}

impl ServerConfig {
    /// Load defaults, then `file` if given, then environment variables.
    pub fn load(file: Option<&Path>) -> ServerResult<Self> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = file {
            if !path.exists() {
                return Err(ServerError::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment
            .merge(Env::raw().only(ENV_KEYS))
            .extract()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// `host:port` to listen on.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn is_production(&self) -> bool {
        self.env_name == Environment::Production
    }

    /// Redis settings, or `None` when no database host is configured.
    pub fn persistent_config(&self) -> Option<PersistentConfig> {
        if self.db_host.is_empty() {
            return None;
        }
        let mut config = PersistentConfig::new(&self.db_host, self.db_port)
            .with_database(self.db_name)
            .with_username(&self.db_username);
        if !self.db_password.is_empty() {
            config = config.with_password_file(PathBuf::from(&self.db_password));
        }
        Some(config)
    }
}

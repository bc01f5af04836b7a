use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub host: String,
    pub port: u16,
}

impl Server {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let ip_addr = self
            .host
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::Message(format!("Invalid server host {}: {e}", self.host)))?;

        Ok(SocketAddr::from((ip_addr, self.port)))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Logger {
    pub level: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Database {
    pub migration_path: Option<String>,
    pub clean_start: bool,
    pub url: String,
}

impl Database {
    /// Private in-memory database, recreated on every start.
    pub fn in_memory() -> Self {
        Self {
            migration_path: None,
            clean_start: true,
            url: String::from("sqlite::memory:"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    pub secret: String,
    /// Token lifetime in seconds
    pub expiration: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub server: Server,
    pub logger: Logger,
    pub database: Database,
    pub auth: Auth,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or("development".into());

        let mut settings: Settings = Config::builder()
            .add_source(File::with_name("configs/default"))
            .add_source(File::with_name(&format!("configs/{run_mode}")).required(false))
            .add_source(Environment::default().separator("_"))
            .build()?
            .try_deserialize()?;

        if let Some(migrate) = &settings.database.migration_path {
            if !Path::new(migrate).is_dir() {
                tracing::warn!("migration path {} is not a directory, skipping", migrate);
                settings.database.migration_path = None;
            }
        }

        Ok(settings)
    }
}

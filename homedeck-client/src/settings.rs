use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, Environment, Map};
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "HOMEDECK";

/// Which implementation backs the registry contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryMode {
    Remote,
    Simulated,
    /// Homes and rooms remote, devices simulated
    Hybrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSettings {
    pub api_base_url: String,
    pub use_mock: bool,
    pub use_mock_devices: bool,
    pub token_path: Option<PathBuf>,
    pub poll_interval_ms: u64,
    pub mock_latency_ms: u64,
    pub log_level: String,
}

impl ClientSettings {
    /// Reads `HOMEDECK_*` variables, after loading a `.env` file when present.
    pub fn new() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::Message(format!("Failed to read .env: {e}")));
            }
        }

        Self::from_environment(Environment::with_prefix(ENV_PREFIX))
    }

    /// Same as [`ClientSettings::new`] but reads the given variables instead of the process environment.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source: Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();

        Self::from_environment(Environment::with_prefix(ENV_PREFIX).source(Some(source)))
    }

    fn from_environment(environment: Environment) -> Result<Self, ConfigError> {
        let settings: Self = Config::builder()
            .set_default("api_base_url", "http://localhost:3000")?
            .set_default("use_mock", false)?
            .set_default("use_mock_devices", false)?
            .set_default("poll_interval_ms", 2000)?
            .set_default("mock_latency_ms", 400)?
            .set_default("log_level", "info")?
            .add_source(environment.try_parsing(true))
            .build()?
            .try_deserialize()?;

        if settings.poll_interval_ms == 0 {
            return Err(ConfigError::Message("poll_interval_ms must be at least 1".to_string()));
        }

        Ok(settings)
    }

    pub fn mode(&self) -> RegistryMode {
        if self.use_mock {
            RegistryMode::Simulated
        } else if self.use_mock_devices {
            RegistryMode::Hybrid
        } else {
            RegistryMode::Remote
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn mock_latency(&self) -> Duration {
        Duration::from_millis(self.mock_latency_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ClientSettings::from_vars(Vec::<(String, String)>::new()).unwrap();

        assert_eq!(settings.api_base_url, "http://localhost:3000");
        assert_eq!(settings.mode(), RegistryMode::Remote);
        assert_eq!(settings.token_path, None);
        assert_eq!(settings.poll_interval(), Duration::from_secs(2));
        assert_eq!(settings.mock_latency(), Duration::from_millis(400));
        assert_eq!(settings.log_level, "info");
    }

    #[test]
    fn test_mode_selection() {
        let hybrid = ClientSettings::from_vars([("HOMEDECK_USE_MOCK_DEVICES", "true")]).unwrap();
        assert_eq!(hybrid.mode(), RegistryMode::Hybrid);

        let simulated = ClientSettings::from_vars([
            ("HOMEDECK_USE_MOCK", "true"),
            ("HOMEDECK_USE_MOCK_DEVICES", "true"),
        ])
        .unwrap();
        assert_eq!(simulated.mode(), RegistryMode::Simulated);
    }

    #[test]
    fn test_overrides() {
        let settings = ClientSettings::from_vars([
            ("HOMEDECK_API_BASE_URL", "http://10.0.0.2:8080"),
            ("HOMEDECK_TOKEN_PATH", "/tmp/homedeck-token"),
            ("HOMEDECK_POLL_INTERVAL_MS", "500"),
            ("HOMEDECK_MOCK_LATENCY_MS", "0"),
        ])
        .unwrap();

        assert_eq!(settings.api_base_url, "http://10.0.0.2:8080");
        assert_eq!(settings.token_path, Some(PathBuf::from("/tmp/homedeck-token")));
        assert_eq!(settings.poll_interval(), Duration::from_millis(500));
        assert!(settings.mock_latency().is_zero());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let result = ClientSettings::from_vars([("HOMEDECK_POLL_INTERVAL_MS", "0")]);

        assert!(matches!(result, Err(ConfigError::Message(message)) if message.contains("poll_interval_ms")));
    }
}

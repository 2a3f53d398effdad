//! Configuration loading.
//!
//! Settings come from `config/config.toml` (optional) and environment
//! variables prefixed with `IMPALA_LITE`, e.g. `IMPALA_LITE__POOL__MAX=30`.

pub use crate::pool::config::*;
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

const CONFIG_FILE: &str = "config/config.toml";
const ENV_PREFIX: &str = "IMPALA_LITE";

/// Engine endpoint settings handed to the driver
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_result_type")]
    pub result_type: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_host() -> String {
    "localhost".to_string()
}

fn default_port() -> u16 {
    21000 // Beeswax
}

fn default_result_type() -> String {
    "json-array".to_string()
}

fn default_timeout_ms() -> u64 {
    5_000
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            result_type: default_result_type(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ImpalaLiteConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub pool: PoolConfig,
}

impl ImpalaLiteConfig {
    /// Load from `config/config.toml`, falling back to env vars.
    pub fn load() -> Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(env_source());

        let settings = match builder.build() {
            Ok(cfg) => cfg,
            Err(err) => {
                // The file exists but could not be read or parsed
                if std::path::Path::new(CONFIG_FILE).exists() {
                    log::warn!("Failed to load config file, falling back to env. Error: {err}");
                }
                Config::builder()
                    .add_source(env_source())
                    .build()
                    .map_err(|env_err| {
                        ConfigError::Message(format!(
                            "Failed to load configuration from file and env: {err}, then env-only error: {env_err}"
                        ))
                    })?
            }
        };

        Self::from_config(settings)
    }

    /// Deserialize and validate an already-built [`Config`].
    pub fn from_config(settings: Config) -> Result<Self, ConfigError> {
        let loaded: ImpalaLiteConfig = settings.try_deserialize()?;
        loaded
            .pool
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;
        Ok(loaded)
    }
}

fn env_source() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_from_toml_source() {
        let settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [connection]
                host = "impala.internal"
                port = 21050

                [pool]
                max = 8
                acquire_timeout_ms = 500
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let loaded = ImpalaLiteConfig::from_config(settings).unwrap();
        assert_eq!(loaded.connection.host, "impala.internal");
        assert_eq!(loaded.connection.port, 21050);
        assert_eq!(loaded.connection.result_type, "json-array");
        assert_eq!(loaded.pool.max, 8);
        assert_eq!(loaded.pool.acquire_timeout_ms, 500);
        assert_eq!(loaded.pool.idle_timeout_ms, 9_000);
    }

    #[test]
    fn test_empty_source_gives_defaults() {
        let settings = Config::builder().build().unwrap();
        assert_eq!(
            ImpalaLiteConfig::from_config(settings).unwrap(),
            ImpalaLiteConfig::default()
        );
    }

    #[test]
    fn test_invalid_pool_is_rejected() {
        let settings = Config::builder()
            .add_source(File::from_str("[pool]\nmax = 1\nmin = 3\n", FileFormat::Toml))
            .build()
            .unwrap();
        assert!(ImpalaLiteConfig::from_config(settings).is_err());
    }
}

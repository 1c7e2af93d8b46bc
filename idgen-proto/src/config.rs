use std::fs::read_to_string;
use std::net::SocketAddr;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

const DATABASE_URL_ENV: &str = "IDGEN_DATABASE_URL";
const LISTEN_ADDR_ENV: &str = "IDGEN_LISTEN_ADDR";

/// Process-level configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub table_name: String,
    /// Reservation stride. Must be >= 1; validated at registry construction,
    /// not here, since the zero-value is only meaningful once a counter is
    /// built from it.
    pub skip: u64,
    #[serde(with = "idle_timeout_secs")]
    pub idle_timeout: Duration,
    pub enabled_keys: Vec<String>,
    pub listen_addr: SocketAddr,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid {0} override: {1}")]
    InvalidOverride(&'static str, String),
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let raw = read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    /// Applies `IDGEN_DATABASE_URL`/`IDGEN_LISTEN_ADDR` env overrides, if set,
    /// mirroring the original engine's DSN-from-environment convention.
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(url) = std::env::var(DATABASE_URL_ENV) {
            self.database_url = url;
        }
        if let Ok(addr) = std::env::var(LISTEN_ADDR_ENV) {
            self.listen_addr = addr
                .parse()
                .map_err(|_| ConfigError::InvalidOverride(LISTEN_ADDR_ENV, addr))?;
        }
        Ok(self)
    }
}

mod idle_timeout_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_well_formed_config() {
        let toml = r#"
            database_url = "mysql://root@127.0.0.1/idgen"
            table_name = "counters"
            skip = 100
            idle_timeout = 10
            enabled_keys = ["users", "orders"]
            listen_addr = "0.0.0.0:8088"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.table_name, "counters");
        assert_eq!(config.skip, 100);
        assert_eq!(config.idle_timeout, Duration::from_secs(10));
        assert_eq!(config.enabled_keys, vec!["users", "orders"]);
    }

    #[test]
    fn env_override_replaces_database_url() {
        let toml = r#"
            database_url = "mysql://root@127.0.0.1/idgen"
            table_name = "counters"
            skip = 100
            idle_timeout = 10
            enabled_keys = []
            listen_addr = "0.0.0.0:8088"
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        std::env::set_var(DATABASE_URL_ENV, "mysql://override@127.0.0.1/idgen");
        let config = config.with_env_overrides().unwrap();
        std::env::remove_var(DATABASE_URL_ENV);
        assert_eq!(config.database_url, "mysql://override@127.0.0.1/idgen");
    }
}

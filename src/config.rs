use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Database
    pub database_path: PathBuf,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
    pub site_name: String,

    // Comment views
    pub view_capacity: usize,
    pub view_idle_timeout: Duration,

    // Sessions
    pub session_cleanup_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("./data/quillboard.sqlite"),
            web_host: "0.0.0.0".to_string(),
            web_port: 8080,
            site_name: "Quillboard".to_string(),
            view_capacity: 2048,
            view_idle_timeout: Duration::from_secs(1800),
            session_cleanup_interval: Duration::from_secs(3600),
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Database
            database_path: PathBuf::from(env_or_default(
                "DATABASE_PATH",
                "./data/quillboard.sqlite",
            )),

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8080)?,
            site_name: env_or_default("SITE_NAME", "Quillboard"),

            // Comment views
            view_capacity: parse_env_usize("VIEW_CAPACITY", 2048)?,
            view_idle_timeout: Duration::from_secs(parse_env_u64("VIEW_IDLE_SECS", 1800)?),

            // Sessions
            session_cleanup_interval: Duration::from_secs(parse_env_u64(
                "SESSION_CLEANUP_INTERVAL_SECS",
                3600,
            )?),
        })
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.view_capacity == 0 {
            return Err(ConfigError::InvalidValue {
                name: "VIEW_CAPACITY".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.view_idle_timeout.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "VIEW_IDLE_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.session_cleanup_interval.is_zero() {
            return Err(ConfigError::InvalidValue {
                name: "SESSION_CLEANUP_INTERVAL_SECS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        if self.site_name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "SITE_NAME".to_string(),
                message: "cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.web_port, 8080);
        assert_eq!(config.site_name, "Quillboard");
    }

    #[test]
    #[serial]
    fn test_from_env_reads_overrides() {
        std::env::set_var("WEB_PORT", "9191");
        std::env::set_var("VIEW_CAPACITY", "16");
        let config = Config::from_env().unwrap();
        std::env::remove_var("WEB_PORT");
        std::env::remove_var("VIEW_CAPACITY");

        assert_eq!(config.web_port, 9191);
        assert_eq!(config.view_capacity, 16);
    }

    #[test]
    #[serial]
    fn test_from_env_rejects_garbage_port() {
        std::env::set_var("WEB_PORT", "not-a-port");
        let result = Config::from_env();
        std::env::remove_var("WEB_PORT");

        assert!(matches!(result, Err(ConfigError::ParseInt { .. })));
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let config = Config {
            view_capacity: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}

//! Environment-variable configuration.

use std::env;
use std::str::FromStr;

/// Runtime settings, all overridable via `DEPLOYDECK_*` environment
/// variables. Unparseable values fall back to the defaults.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP port for the web server.
    pub http_port: u16,
    /// Path to the SQLite database file.
    pub db_path: String,
    /// Dashboard lookback in days applied when a query omits `start`.
    pub default_range_days: i64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            db_path: "deploydeck.db".to_string(),
            default_range_days: 30,
        }
    }
}

fn env_parse<T: FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.parse().ok())
}

impl ServerConfig {
    /// Load configuration from the environment:
    /// `DEPLOYDECK_HTTP_PORT`, `DEPLOYDECK_DB_PATH`,
    /// `DEPLOYDECK_DEFAULT_RANGE_DAYS`.
    pub fn load() -> Self {
        let defaults = Self::default();
        Self {
            http_port: env_parse("DEPLOYDECK_HTTP_PORT").unwrap_or(defaults.http_port),
            db_path: env::var("DEPLOYDECK_DB_PATH").unwrap_or(defaults.db_path),
            default_range_days: env_parse("DEPLOYDECK_DEFAULT_RANGE_DAYS")
                .filter(|days: &i64| *days > 0)
                .unwrap_or(defaults.default_range_days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = ServerConfig::default();
        assert_eq!(cfg.http_port, 8080);
        assert_eq!(cfg.db_path, "deploydeck.db");
        assert_eq!(cfg.default_range_days, 30);
    }

    // One test owns the env var; parallel tests must not share it.
    #[test]
    fn test_range_days_env_override() {
        env::set_var("DEPLOYDECK_DEFAULT_RANGE_DAYS", "7");
        assert_eq!(ServerConfig::load().default_range_days, 7);

        env::set_var("DEPLOYDECK_DEFAULT_RANGE_DAYS", "-3");
        assert_eq!(ServerConfig::load().default_range_days, 30);

        env::remove_var("DEPLOYDECK_DEFAULT_RANGE_DAYS");
    }
}

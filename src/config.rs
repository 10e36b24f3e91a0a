use crate::calendar::TARGET_YEAR;
use crate::errors::ConfigError;
use crate::storage::DEFAULT_DATA_PATH;
use std::{env, path::PathBuf, time::Duration};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_SAVE_DEBOUNCE: Duration = Duration::from_millis(450);
pub const DEFAULT_TABLE: &str = "entries";
pub const DEFAULT_PROVIDER: &str = "google";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestConfig {
    pub base_url: String,
    pub api_key: String,
    pub table: String,
    pub provider: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendConfig {
    File { data_path: PathBuf },
    Rest(RestConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub port: u16,
    pub year: i32,
    pub save_debounce: Duration,
    pub backend: BackendConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match var("PORT") {
            Some(value) => parse(&value, "PORT", "a port number")?,
            None => DEFAULT_PORT,
        };
        let year = match var("TARGET_YEAR") {
            Some(value) => parse(&value, "TARGET_YEAR", "a calendar year")?,
            None => TARGET_YEAR,
        };
        let save_debounce = match var("SAVE_DEBOUNCE_MS") {
            Some(value) => Duration::from_millis(parse(&value, "SAVE_DEBOUNCE_MS", "milliseconds")?),
            None => DEFAULT_SAVE_DEBOUNCE,
        };

        let backend = match (var("BACKEND_URL"), var("BACKEND_ANON_KEY")) {
            (Some(base_url), Some(api_key)) => BackendConfig::Rest(RestConfig {
                base_url: base_url.trim_end_matches('/').to_string(),
                api_key,
                table: var("BACKEND_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
                provider: var("AUTH_PROVIDER").unwrap_or_else(|| DEFAULT_PROVIDER.to_string()),
            }),
            (Some(_), None) => return Err(ConfigError::Incomplete("BACKEND_URL", "BACKEND_ANON_KEY")),
            (None, Some(_)) => return Err(ConfigError::Incomplete("BACKEND_ANON_KEY", "BACKEND_URL")),
            (None, None) => BackendConfig::File {
                data_path: PathBuf::from(
                    var("APP_DATA_PATH").unwrap_or_else(|| DEFAULT_DATA_PATH.to_string()),
                ),
            },
        };

        Ok(Self {
            port,
            year,
            save_debounce,
            backend,
        })
    }
}

fn parse<T: std::str::FromStr>(
    value: &str,
    name: &'static str,
    expected: &'static str,
) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::Invalid {
        name,
        expected,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_use_the_file_backend() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.year, 2026);
        assert_eq!(config.save_debounce, Duration::from_millis(450));
        assert_eq!(
            config.backend,
            BackendConfig::File {
                data_path: PathBuf::from("data/entries.json")
            }
        );
    }

    #[test]
    fn url_and_key_select_the_rest_backend() {
        let config = config_from(&[
            ("BACKEND_URL", "https://example.test/"),
            ("BACKEND_ANON_KEY", "anon"),
            ("SAVE_DEBOUNCE_MS", "200"),
        ])
        .unwrap();
        assert_eq!(config.save_debounce, Duration::from_millis(200));
        match config.backend {
            BackendConfig::Rest(rest) => {
                assert_eq!(rest.base_url, "https://example.test");
                assert_eq!(rest.table, "entries");
                assert_eq!(rest.provider, "google");
            }
            other => panic!("unexpected backend {other:?}"),
        }
    }

    #[test]
    fn half_configured_backend_is_rejected() {
        let err = config_from(&[("BACKEND_URL", "https://example.test")]).unwrap_err();
        assert!(matches!(err, ConfigError::Incomplete("BACKEND_URL", _)));
    }

    #[test]
    fn bad_numbers_name_the_variable() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err.to_string(), "PORT must be a port number, got `eighty`");
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "  "), ("APP_DATA_PATH", "")]).unwrap();
        assert_eq!(config.port, 8080);
    }
}

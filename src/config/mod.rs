use chrono::Duration;
use serde::Deserialize;
use std::env;
use std::str::FromStr;

use crate::error::ConfigError;

// Главная структура конфигурации - контейнер для всех настроек
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub backend: BackendConfig,
    pub circuit_breaker: CircuitBreakerConfig,
    pub selection: SelectionConfig,
}

// Настройки приложения
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub rust_log: String,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

// Внешний REST-бэкенд с автобусами и местами
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    pub base_url: String,
    pub timeout_seconds: u64,
}

// Настройки Circuit Breaker
#[derive(Debug, Clone, Deserialize)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout_seconds: u64,
}

// Сессии выбора мест
#[derive(Debug, Clone, Deserialize)]
pub struct SelectionConfig {
    pub session_ttl_minutes: i64,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Собирает конфигурацию из произвольного источника переменных.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        Ok(Config {
            app: AppConfig {
                host: text("HOST", "0.0.0.0"),
                port: parse(&lookup, "PORT", "8000")?,
                environment: text("ENVIRONMENT", "development"),
                rust_log: text("RUST_LOG", "seat_selection=debug,tower_http=debug"),
            },
            backend: BackendConfig {
                base_url: text(
                    "BACKEND_BASE_URL",
                    "https://linkedbus-backend-production.up.railway.app/api",
                )
                .trim_end_matches('/')
                .to_string(),
                timeout_seconds: parse(&lookup, "BACKEND_TIMEOUT_SECONDS", "15")?,
            },
            circuit_breaker: CircuitBreakerConfig {
                failure_threshold: parse(&lookup, "CIRCUIT_BREAKER_FAILURE_THRESHOLD", "5")?,
                timeout_seconds: parse(&lookup, "CIRCUIT_BREAKER_TIMEOUT_SECONDS", "60")?,
            },
            selection: SelectionConfig {
                session_ttl_minutes: session_ttl(&lookup)?,
            },
        })
    }
}

// TTL должен быть положительным и помещаться в chrono::Duration
fn session_ttl<F>(lookup: &F) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    const KEY: &str = "SELECTION_SESSION_TTL_MINUTES";
    let minutes: i64 = parse(lookup, KEY, "30")?;

    match Duration::try_minutes(minutes) {
        Some(ttl) if ttl > Duration::zero() => Ok(minutes),
        _ => Err(ConfigError::Invalid {
            key: KEY,
            value: minutes.to_string(),
            reason: "must be a positive number of minutes".to_string(),
        }),
    }
}

fn parse<T, F>(lookup: &F, key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(key).unwrap_or_else(|| default.to_string());
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key,
        value: value.clone(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_when_environment_is_empty() {
        let config = config(&[]).unwrap();

        assert_eq!(config.app.port, 8000);
        assert_eq!(config.backend.timeout_seconds, 15);
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
        assert_eq!(config.selection.session_ttl_minutes, 30);
        assert!(!config.app.is_production());
    }

    #[test]
    fn overrides_and_trailing_slash() {
        let config = config(&[
            ("PORT", "9090"),
            ("ENVIRONMENT", "Production"),
            ("BACKEND_BASE_URL", "http://localhost:8080/api/"),
        ])
        .unwrap();

        assert_eq!(config.app.port, 9090);
        assert!(config.app.is_production());
        assert_eq!(config.backend.base_url, "http://localhost:8080/api");
    }

    #[test]
    fn invalid_number_is_reported() {
        let err = config(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().starts_with("PORT has invalid value 'eighty'"));
    }

    #[test]
    fn session_ttl_must_be_positive_and_in_range() {
        for bad in ["0", "-5", "9223372036854775807"] {
            let err = config(&[("SELECTION_SESSION_TTL_MINUTES", bad)]).unwrap_err();
            assert!(err
                .to_string()
                .starts_with("SELECTION_SESSION_TTL_MINUTES has invalid value"));
        }

        let config = config(&[("SELECTION_SESSION_TTL_MINUTES", "5")]).unwrap();
        assert_eq!(config.selection.session_ttl_minutes, 5);
    }
}

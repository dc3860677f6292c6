//! Load settings from the environment (and `.env`, when present).

use crate::config::types::{DatabaseSettings, ServerSettings, DEFAULT_BIND_ADDR, TEST_DATABASE_NAME};
use crate::error::ConfigError;

/// `DATABASE_URI` and `DATABASE_NAME`. In test mode the name is always [`TEST_DATABASE_NAME`].
pub fn load_database_settings(test: bool) -> Result<DatabaseSettings, ConfigError> {
    dotenvy::dotenv().ok();
    database_settings_from(test, |key| std::env::var(key).ok())
}

/// `BIND_ADDR`, defaulting to [`DEFAULT_BIND_ADDR`].
pub fn load_server_settings() -> Result<ServerSettings, ConfigError> {
    dotenvy::dotenv().ok();
    server_settings_from(|key| std::env::var(key).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub(crate) fn database_settings_from<F>(test: bool, lookup: F) -> Result<DatabaseSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let uri = non_empty(lookup("DATABASE_URI")).ok_or(ConfigError::MissingVar("DATABASE_URI"))?;
    let name = if test {
        TEST_DATABASE_NAME.to_string()
    } else {
        non_empty(lookup("DATABASE_NAME")).ok_or(ConfigError::MissingVar("DATABASE_NAME"))?
    };
    let settings = DatabaseSettings { uri, name };
    settings.backend()?;
    Ok(settings)
}

pub(crate) fn server_settings_from<F>(lookup: F) -> Result<ServerSettings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = non_empty(lookup("BIND_ADDR")).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
    let bind_addr = raw.parse().map_err(|_| ConfigError::Invalid {
        name: "BIND_ADDR",
        value: raw.clone(),
    })?;
    Ok(ServerSettings { bind_addr })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Backend;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_uri_and_name() {
        let s = database_settings_from(
            false,
            env(&[("DATABASE_URI", "mongodb://localhost:27017"), ("DATABASE_NAME", "app")]),
        )
        .unwrap();
        assert_eq!(s.name, "app");
        assert_eq!(s.backend().unwrap(), Backend::Mongo);
    }

    #[test]
    fn test_mode_uses_test_db() {
        let s = database_settings_from(true, env(&[("DATABASE_URI", "memory://"), ("DATABASE_NAME", "app")])).unwrap();
        assert_eq!(s.name, TEST_DATABASE_NAME);
    }

    #[test]
    fn missing_values_are_errors() {
        assert!(matches!(
            database_settings_from(false, env(&[])),
            Err(ConfigError::MissingVar("DATABASE_URI"))
        ));
        assert!(matches!(
            database_settings_from(false, env(&[("DATABASE_URI", "memory://"), ("DATABASE_NAME", " ")])),
            Err(ConfigError::MissingVar("DATABASE_NAME"))
        ));
    }

    #[test]
    fn unknown_scheme_is_rejected() {
        let err = database_settings_from(true, env(&[("DATABASE_URI", "redis://localhost")])).unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedScheme(s) if s == "redis"));
    }

    #[test]
    fn bind_addr_defaults_and_validates() {
        assert_eq!(
            server_settings_from(env(&[])).unwrap().bind_addr.to_string(),
            DEFAULT_BIND_ADDR
        );
        assert_eq!(
            server_settings_from(env(&[("BIND_ADDR", "127.0.0.1:9000")])).unwrap().bind_addr.port(),
            9000
        );
        assert!(server_settings_from(env(&[("BIND_ADDR", "nowhere")])).is_err());
    }
}

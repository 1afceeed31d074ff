use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "PatientDesk";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default API bind address (loopback only).
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4780";

/// Environment variable overriding the API bind address.
pub const ENV_BIND: &str = "PATIENTDESK_BIND";

/// Environment variable overriding the database file location.
pub const ENV_DB: &str = "PATIENTDESK_DB";

/// Get the application data directory
/// ~/PatientDesk/ on all platforms
pub fn app_data_dir() -> Result<PathBuf, ConfigError> {
    let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
    Ok(home.join("PatientDesk"))
}

/// Get the default database file path
pub fn database_path() -> Result<PathBuf, ConfigError> {
    Ok(app_data_dir()?.join("patients.db"))
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    "info,patientdesk_lib=debug,tower_http=info"
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Cannot determine home directory")]
    NoHomeDir,

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },
}

/// Runtime settings for the API server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_path: PathBuf,
}

impl AppConfig {
    /// Build config from the process environment, falling back to defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary key lookup (tests inject a map).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_raw = lookup(ENV_BIND).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue {
                var: ENV_BIND,
                value: bind_raw.clone(),
            })?;

        let database_path = match lookup(ENV_DB) {
            Some(path) if !path.trim().is_empty() => PathBuf::from(path),
            Some(path) => {
                return Err(ConfigError::InvalidValue {
                    var: ENV_DB,
                    value: path,
                })
            }
            None => database_path()?,
        };

        Ok(Self {
            bind_addr,
            database_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir().unwrap();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("PatientDesk"));
    }

    #[test]
    fn database_path_under_app_data() {
        let db = database_path().unwrap();
        assert!(db.starts_with(app_data_dir().unwrap()));
        assert!(db.ends_with("patients.db"));
    }

    #[test]
    fn app_name_is_patientdesk() {
        assert_eq!(APP_NAME, "PatientDesk");
    }

    #[test]
    fn defaults_when_env_empty() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_addr.to_string(), DEFAULT_BIND_ADDR);
        assert!(config.database_path.ends_with("patients.db"));
    }

    #[test]
    fn env_overrides_bind_and_db() {
        let config = AppConfig::from_lookup(lookup_from(&[
            (ENV_BIND, "0.0.0.0:9000"),
            (ENV_DB, "/tmp/custom.db"),
        ]))
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.database_path, PathBuf::from("/tmp/custom.db"));
    }

    #[test]
    fn invalid_bind_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_BIND, "not-an-addr")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: ENV_BIND, .. }));
    }

    #[test]
    fn blank_db_path_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[(ENV_DB, "  ")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: ENV_DB, .. }));
    }
}

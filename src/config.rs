use std::collections::HashMap;

use crate::database::DEFAULT_DATABASE_PATH;

pub const DEFAULT_PORT: u16 = 3001;

/// Server settings loaded from environment variables. CLI flags override
/// individual fields after loading.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub port: u16,
    pub database_path: String,
    /// `None` allows any origin.
    pub cors_origin: Option<String>,
    pub seed_on_start: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::from_map(&HashMap::new())
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let mut values = HashMap::new();
        for key in Self::tracked_keys() {
            if let Ok(value) = std::env::var(key) {
                values.insert(key.to_string(), value);
            }
        }
        Self::from_map(&values)
    }

    pub fn from_map(values: &HashMap<String, String>) -> Self {
        fn read(values: &HashMap<String, String>, key: &str) -> Option<String> {
            values
                .get(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        }

        let port = read(values, "CHATFLOW_PORT")
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        let database_path = read(values, "CHATFLOW_DATABASE")
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());
        let cors_origin = read(values, "CHATFLOW_CORS_ORIGIN").filter(|value| value != "*");
        let seed_on_start = read(values, "CHATFLOW_SEED_ON_START")
            .map(|value| matches!(value.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Self {
            port,
            database_path,
            cors_origin,
            seed_on_start,
        }
    }

    fn tracked_keys() -> [&'static str; 4] {
        [
            "CHATFLOW_PORT",
            "CHATFLOW_DATABASE",
            "CHATFLOW_CORS_ORIGIN",
            "CHATFLOW_SEED_ON_START",
        ]
    }

    pub fn with_overrides(
        mut self,
        port: Option<u16>,
        database_path: Option<String>,
        cors_origin: Option<String>,
        seed: bool,
    ) -> Self {
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(path) = database_path {
            self.database_path = path;
        }
        if let Some(origin) = cors_origin {
            self.cors_origin = Some(origin).filter(|value| value != "*");
        }
        self.seed_on_start |= seed;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = ServerConfig::from_map(&HashMap::new());
        assert_eq!(config.port, 3001);
        assert_eq!(config.database_path, "chatflow.db");
        assert_eq!(config.cors_origin, None);
        assert!(!config.seed_on_start);
    }

    #[test]
    fn reads_values_and_ignores_garbage() {
        let config = ServerConfig::from_map(&values(&[
            ("CHATFLOW_PORT", "not-a-port"),
            ("CHATFLOW_DATABASE", "/tmp/support.db"),
            ("CHATFLOW_CORS_ORIGIN", "http://localhost:5173"),
            ("CHATFLOW_SEED_ON_START", "TRUE"),
        ]));
        assert_eq!(config.port, 3001);
        assert_eq!(config.database_path, "/tmp/support.db");
        assert_eq!(config.cors_origin.as_deref(), Some("http://localhost:5173"));
        assert!(config.seed_on_start);
    }

    #[test]
    fn cli_flags_win() {
        let config = ServerConfig::from_map(&values(&[("CHATFLOW_PORT", "8080")]))
            .with_overrides(Some(9000), None, Some("*".to_string()), false);
        assert_eq!(config.port, 9000);
        assert_eq!(config.cors_origin, None);
    }
}

//! Global configuration types for dagctl.
//!
//! `DagctlConfig` represents the `dagctl.toml` file in the data directory.
//! Every section and field has a default, so an empty or missing file is a
//! valid configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DagctlConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub dags: DagsConfig,
    #[serde(default)]
    pub observe: ObserveConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix for links to the web UI (used by `latest_runs`).
    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_web_base_url() -> String {
    "/admin".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            web_base_url: default_web_base_url(),
        }
    }
}

/// Which credential verifier guards the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthBackendKind {
    /// Basic credentials checked against the user store.
    #[default]
    Password,
    /// Every request is let through as anonymous.
    AllowAll,
    /// Every request is refused.
    DenyAll,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub backend: AuthBackendKind,
}

/// Where DAG definition files live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DagsConfig {
    /// Relative paths are resolved against the data directory.
    #[serde(default = "default_dags_folder")]
    pub folder: PathBuf,
}

fn default_dags_folder() -> PathBuf {
    PathBuf::from("dags")
}

impl Default for DagsConfig {
    fn default() -> Self {
        Self {
            folder: default_dags_folder(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObserveConfig {
    /// Export spans to stdout through OpenTelemetry.
    #[serde(default)]
    pub otel: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default_values() {
        let config = DagctlConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.auth.backend, AuthBackendKind::Password);
        assert_eq!(config.dags.folder, PathBuf::from("dags"));
        assert!(!config.observe.otel);
    }

    #[test]
    fn test_config_deserialize_empty() {
        let config: DagctlConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.web_base_url, "/admin");
    }

    #[test]
    fn test_config_deserialize_with_values() {
        let toml_str = r#"
[server]
port = 9090
web_base_url = "https://scheduler.example.com/admin"

[auth]
backend = "allow_all"

[dags]
folder = "/srv/dags"

[observe]
otel = true
"#;
        let config: DagctlConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.auth.backend, AuthBackendKind::AllowAll);
        assert_eq!(config.dags.folder, PathBuf::from("/srv/dags"));
        assert!(config.observe.otel);
    }

    #[test]
    fn test_config_rejects_unknown_backend() {
        let result: Result<DagctlConfig, _> = toml::from_str("[auth]\nbackend = \"ldap\"\n");
        assert!(result.is_err());
    }
}

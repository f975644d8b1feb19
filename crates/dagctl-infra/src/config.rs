//! Configuration loader for dagctl.
//!
//! Reads `dagctl.toml` (by default from the data directory) and deserializes
//! it into [`DagctlConfig`]. A missing file means defaults; a file that is
//! present but unreadable or malformed is an error.

use std::path::Path;

use anyhow::Context;

use dagctl_types::config::DagctlConfig;

/// Load configuration from `config_path`.
///
/// - If the file does not exist, returns [`DagctlConfig::default()`].
/// - If the file exists but fails to read or parse, returns an error naming the path.
/// - Otherwise returns the parsed config.
pub async fn load_config(config_path: &Path) -> anyhow::Result<DagctlConfig> {
    let content = match tokio::fs::read_to_string(config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config found at {}, using defaults", config_path.display());
            return Ok(DagctlConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", config_path.display()));
        }
    };

    toml::from_str::<DagctlConfig>(&content)
        .with_context(|| format!("failed to parse {}", config_path.display()))
}

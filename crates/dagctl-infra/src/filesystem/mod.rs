//! Data directory layout for dagctl.
//!
//! Everything dagctl persists lives under one data directory: the config
//! file, the SQLite database, and (by default) the DAG folder.

use std::path::{Path, PathBuf};

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `DAGCTL_DATA_DIR` environment variable
/// 2. `~/.dagctl`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DAGCTL_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".dagctl");
    }

    // Last resort: current directory
    PathBuf::from(".dagctl")
}

/// Default config file path: `{data_dir}/dagctl.toml`.
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("dagctl.toml")
}

/// Resolve the configured DAG folder. Relative paths are taken from `data_dir`.
pub fn dags_folder(data_dir: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        data_dir.join(configured)
    }
}

/// Create the data directory (and parents) if missing.
pub async fn ensure_data_dir(data_dir: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(data_dir).await
}

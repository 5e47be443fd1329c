//! Workspace layer: `contentpkg.toml` at the workspace root, then
//! `config/config.toml`, then `config/{CONTENTPKG_ENV}.toml`.

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, File, FileFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Selects the per-environment file under `config/`.
pub const ENV_VAR: &str = "CONTENTPKG_ENV";

const DEFAULT_ENV: &str = "development";

/// Candidate workspace files, lowest precedence first. Missing files are
/// skipped when the layer is added.
pub fn workspace_files(workspace_root: &Path) -> Vec<PathBuf> {
    let env_name = std::env::var(ENV_VAR)
        .ok()
        .map(|e| e.trim().to_string())
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| DEFAULT_ENV.to_string());
    let config_dir = workspace_root.join("config");
    vec![
        workspace_root.join("contentpkg.toml"),
        config_dir.join("config.toml"),
        config_dir.join(format!("{}.toml", env_name)),
    ]
}

pub fn add_to_builder(
    builder: ConfigBuilder<DefaultState>,
    workspace_root: &Path,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    let builder = workspace_files(workspace_root)
        .into_iter()
        .filter(|path| path.is_file())
        .fold(builder, |builder, path| {
            debug!(config_path = %path.display(), "Adding workspace configuration");
            builder.add_source(File::from(path).format(FileFormat::Toml))
        });
    Ok(builder)
}
